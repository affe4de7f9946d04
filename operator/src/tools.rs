use clap::ValueEnum;
use kube::Client;

use crate::drill;

/// A benchmark tool, each one has its own custom resource and controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Tool {
    /// The drill HTTP load testing tool.
    Drill,
}

impl Tool {
    /// All tools the operator knows about.
    pub fn all() -> Vec<Tool> {
        Tool::value_variants().to_vec()
    }

    /// Run the controller for the tool until shutdown.
    pub async fn run(self, k_client: Client) {
        match self {
            Tool::Drill => drill::run(k_client).await,
        }
    }
}
