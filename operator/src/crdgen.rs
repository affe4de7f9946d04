use kube::CustomResourceExt;

use loadbench_operator::drill::Drill;

fn main() {
    print!("{}", serde_yaml::to_string(&Drill::crd()).unwrap());
}
