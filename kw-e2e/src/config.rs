use std::collections::BTreeMap;
use std::fs::File;
use std::time::Duration;

use kw_core::errors::*;
use kw_core::prelude::*;
use serde::{
    Deserialize,
    Serialize,
};

err_impl! {ConfigError,
    #[error("{0} timeout must be greater than zero")]
    ZeroTimeout(String),

    #[error("{0} poll interval must be greater than zero")]
    ZeroPollInterval(String),

    #[error("no Jenkinsfile given for build config {0}")]
    MissingJenkinsfile(String),

    #[error("{0} must not be empty")]
    EmptyField(String),
}

// Durations in the scenario file are human-readable strings like "5m" or "90s"
mod human_duration {
    use std::time::Duration;

    use serde::{
        Deserialize,
        Deserializer,
        Serializer,
    };

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&humantime::format_duration(*d).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TemplateStepConfig {
    pub template_namespace: String,
    pub template_name: String,
    pub instance_name: String,
    pub parameters_secret: String,
    pub parameters: BTreeMap<String, String>,
    pub benign_reasons: Vec<String>,

    #[serde(with = "human_duration")]
    pub timeout: Duration,
}

impl Default for TemplateStepConfig {
    fn default() -> TemplateStepConfig {
        TemplateStepConfig {
            template_namespace: DEFAULT_TEMPLATE_NAMESPACE.into(),
            template_name: DEFAULT_TEMPLATE_NAME.into(),
            instance_name: DEFAULT_TEMPLATE_INSTANCE_NAME.into(),
            parameters_secret: DEFAULT_PARAMETERS_SECRET_NAME.into(),
            parameters: BTreeMap::from([("MEMORY_LIMIT".into(), "2048Mi".into())]),
            benign_reasons: vec![ALREADY_EXISTS_REASON.into()],
            timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildStepConfig {
    pub config_name: String,
    pub jenkinsfile_path: Option<String>,

    #[serde(with = "human_duration")]
    pub timeout: Duration,
}

impl Default for BuildStepConfig {
    fn default() -> BuildStepConfig {
        BuildStepConfig {
            config_name: DEFAULT_BUILD_CONFIG_NAME.into(),
            jenkinsfile_path: None,
            timeout: Duration::from_secs(1800),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecPodStepConfig {
    pub name: String,
    pub image: String,
    pub command: String,
    pub service_account: String,

    #[serde(with = "human_duration")]
    pub poll_interval: Duration,

    #[serde(with = "human_duration")]
    pub timeout: Duration,
}

impl Default for ExecPodStepConfig {
    fn default() -> ExecPodStepConfig {
        ExecPodStepConfig {
            name: DEFAULT_EXEC_POD_NAME.into(),
            image: DEFAULT_EXEC_POD_IMAGE.into(),
            command: DEFAULT_EXEC_POD_COMMAND.into(),
            service_account: DEFAULT_EXEC_POD_SERVICE_ACCOUNT.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Duration::from_secs(300),
        }
    }
}

// Where to fetch the Jenkins console log from when the pipeline build fails.  The log is pulled by
// a short-lived pod in the scenario project, since Jenkins is only reachable from inside it.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobLogConfig {
    pub pod_name: String,
    pub jenkins_url: String,

    #[serde(with = "human_duration")]
    pub poll_interval: Duration,

    #[serde(with = "human_duration")]
    pub timeout: Duration,
}

impl Default for JobLogConfig {
    fn default() -> JobLogConfig {
        JobLogConfig {
            pod_name: DEFAULT_JOB_LOG_POD_NAME.into(),
            jenkins_url: DEFAULT_JENKINS_URL.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: Duration::from_secs(300),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioConfig {
    pub namespace: String,
    pub keep_project: bool,
    pub template: TemplateStepConfig,
    pub build: BuildStepConfig,
    pub exec_pod: Option<ExecPodStepConfig>,
    pub job_logs: Option<JobLogConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> ScenarioConfig {
        ScenarioConfig {
            namespace: DEFAULT_TEST_NAMESPACE.into(),
            keep_project: false,
            template: Default::default(),
            build: Default::default(),
            exec_pod: None,
            job_logs: Some(Default::default()),
        }
    }
}

impl ScenarioConfig {
    pub fn load(filename: &str) -> anyhow::Result<ScenarioConfig> {
        Ok(serde_yaml::from_reader(File::open(filename)?)?)
    }

    // Catch anything that would make the scenario fail (or hang) before we touch the cluster
    pub fn validate(&self) -> EmptyResult {
        if self.namespace.is_empty() {
            return Err(ConfigError::empty_field("namespace"));
        }
        if self.template.timeout.is_zero() {
            return Err(ConfigError::zero_timeout("template"));
        }
        if self.build.timeout.is_zero() {
            return Err(ConfigError::zero_timeout("build"));
        }
        if self.build.jenkinsfile_path.as_deref().is_none_or(str::is_empty) {
            return Err(ConfigError::missing_jenkinsfile(&self.build.config_name));
        }

        if let Some(exec_pod) = self.exec_pod.as_ref() {
            if exec_pod.timeout.is_zero() {
                return Err(ConfigError::zero_timeout("exec pod"));
            }
            if exec_pod.poll_interval.is_zero() {
                return Err(ConfigError::zero_poll_interval("exec pod"));
            }
            if exec_pod.command.is_empty() {
                return Err(ConfigError::empty_field("execPod.command"));
            }
        }

        if let Some(job_logs) = self.job_logs.as_ref() {
            if job_logs.timeout.is_zero() {
                return Err(ConfigError::zero_timeout("job log"));
            }
            if job_logs.poll_interval.is_zero() {
                return Err(ConfigError::zero_poll_interval("job log"));
            }
            if job_logs.jenkins_url.is_empty() {
                return Err(ConfigError::empty_field("jobLogs.jenkinsUrl"));
            }
        }
        Ok(())
    }
}
