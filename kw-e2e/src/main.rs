mod config;
mod job_logs;
mod project;
mod steps;

use std::fs;
use std::sync::Arc;

use clap::Parser;
use kw_core::errors::*;
use kw_core::k8s::{
    KubeObjectClient,
    KubePodLogSource,
    PodLogSource,
};
use kw_core::logging;
use kw_core::prelude::*;
use kw_wait::{
    DiagnosticChain,
    DiagnosticHook,
    PodLogCollector,
    StepOrchestrator,
};
use tokio_util::sync::CancellationToken;
use tracing::*;

use crate::config::ScenarioConfig;
use crate::job_logs::JobLogCollector;
use crate::project::Project;

#[derive(Clone, Debug, Parser)]
struct Options {
    #[arg(long, long_help = "YAML scenario file; every setting has a default")]
    config: Option<String>,

    #[arg(long, long_help = "project to run the scenario in (overrides the scenario file)")]
    namespace: Option<String>,

    #[arg(long, long_help = "path to the Jenkinsfile run by the pipeline build")]
    jenkinsfile: Option<String>,

    #[arg(long, long_help = "leave the project in place after the scenario finishes")]
    keep_project: bool,

    #[arg(short, long, default_value = "info")]
    verbosity: String,
}

fn load_config(opts: &Options) -> anyhow::Result<ScenarioConfig> {
    let mut config = match opts.config.as_deref() {
        Some(path) => ScenarioConfig::load(path)?,
        None => ScenarioConfig::default(),
    };

    if let Some(ns) = opts.namespace.as_ref() {
        config.namespace.clone_from(ns);
    }
    if let Some(path) = opts.jenkinsfile.as_ref() {
        config.build.jenkinsfile_path = Some(path.clone());
    }
    config.keep_project |= opts.keep_project;

    config.validate()?;
    Ok(config)
}

// Ctrl-C cancels whatever wait is in flight; the project still gets torn down afterwards.
// The Jenkins job log (for failed builds) goes out before the namespace's pod logs
fn diagnostics(client: kube::Client, config: &ScenarioConfig) -> DiagnosticChain {
    let logs: Arc<dyn PodLogSource> = Arc::new(KubePodLogSource::new(client.clone()));
    let mut hooks: Vec<Arc<dyn DiagnosticHook>> = vec![];
    if let Some(job_logs) = config.job_logs.as_ref() {
        hooks.push(Arc::new(JobLogCollector::new(
            Arc::new(KubeObjectClient::<corev1::Pod>::new(client)),
            logs.clone(),
            &config.build.config_name,
            job_logs.clone(),
        )));
    }
    hooks.push(Arc::new(PodLogCollector::new(logs)));
    DiagnosticChain::new(hooks)
}

fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling the scenario");
            token.cancel();
        }
    });
    cancel
}

#[instrument(ret, err)]
async fn run(opts: Options) -> EmptyResult {
    let config = load_config(&opts)?;
    let jenkinsfile_path = config.build.jenkinsfile_path.as_deref().unwrap_or_default();
    let jenkinsfile = fs::read_to_string(jenkinsfile_path)?;

    let client = kube::Client::try_default().await?;
    let project = Project::request(client.clone(), &config.namespace).await?;

    let orchestrator = StepOrchestrator::new(Arc::new(diagnostics(client.clone(), &config)), cancel_on_interrupt());
    let scenario = steps::scenario_steps(client, &config, &jenkinsfile);
    let res = orchestrator.run_all(&scenario).await;

    if config.keep_project {
        info!("keeping project {}", project.name());
    } else if let Err(err) = project.delete().await {
        warn!("could not delete project {}: {err}", project.name());
    }

    for report in res? {
        info!("step {} finished: {} ready after {:?}", report.step, report.resource, report.elapsed);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Options::parse();
    logging::setup(&args.verbosity);
    if let Err(err) = run(args).await {
        kwerr!(err, "scenario failed");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests;
