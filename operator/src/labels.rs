use std::collections::BTreeMap;

/// Manage by label
pub const MANAGED_BY_LABEL_SELECTOR: &str = "managed-by=loadbench";

/// Label naming the benchmark resource that owns a workload.
pub const BENCHMARK_LABEL: &str = "loadbench.io/benchmark";

/// Labels that indicate the resource is managed by the loadbench operator.
pub fn managed_labels() -> Option<BTreeMap<String, String>> {
    Some(BTreeMap::from_iter(vec![(
        "managed-by".to_owned(),
        "loadbench".to_owned(),
    )]))
}

/// Managed labels plus the name of the owning benchmark resource.
pub fn benchmark_labels(benchmark: &str) -> Option<BTreeMap<String, String>> {
    managed_labels().map(|mut labels| {
        labels.insert(BENCHMARK_LABEL.to_owned(), benchmark.to_owned());
        labels
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmark_labels_extend_managed_labels() {
        let labels = benchmark_labels("sample").unwrap();
        assert_eq!(labels.get("managed-by").map(String::as_str), Some("loadbench"));
        assert_eq!(labels.get(BENCHMARK_LABEL).map(String::as_str), Some("sample"));
        assert_eq!(labels.len(), 2);
    }
}
