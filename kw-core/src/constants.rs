use std::time::Duration;

// OpenShift API groups and resource plurals for the objects we only handle dynamically
pub const PROJECT_API_GROUP: &str = "project.openshift.io";
pub const PROJECT_REQUEST_KIND: &str = "ProjectRequest";
pub const PROJECT_REQUEST_PLURAL: &str = "projectrequests";
pub const PROJECT_KIND: &str = "Project";
pub const PROJECT_PLURAL: &str = "projects";
pub const TEMPLATE_API_GROUP: &str = "template.openshift.io";
pub const TEMPLATE_KIND: &str = "Template";
pub const TEMPLATE_PLURAL: &str = "templates";

// Condition reasons
pub const ALREADY_EXISTS_REASON: &str = "AlreadyExists";
pub const DELETED_REASON: &str = "Deleted";
pub const WATCH_ERROR_REASON: &str = "WatchError";

// Watch stream parameters; the apiserver refuses watch timeouts of 295s or more
pub const FRESH_RESOURCE_VERSION: &str = "0";
pub const DEFAULT_WATCH_WINDOW: Duration = Duration::from_secs(290);
pub const MIN_WATCH_WINDOW: Duration = Duration::from_secs(1);
pub const MAX_WATCH_WINDOW: Duration = Duration::from_secs(294);
pub const WATCH_WINDOW_SLACK: Duration = Duration::from_secs(5);

// Timing
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

// Scenario defaults
pub const DEFAULT_TEST_NAMESPACE: &str = "jenkins-client-plugin-test-namespace";
pub const DEFAULT_TEMPLATE_NAMESPACE: &str = "openshift";
pub const DEFAULT_TEMPLATE_NAME: &str = "jenkins-ephemeral";
pub const DEFAULT_TEMPLATE_INSTANCE_NAME: &str = "templateinstance";
pub const DEFAULT_PARAMETERS_SECRET_NAME: &str = "parameters";
pub const DEFAULT_BUILD_CONFIG_NAME: &str = "client-plugin-sample";
pub const DEFAULT_EXEC_POD_NAME: &str = "hostexec";
pub const DEFAULT_EXEC_POD_IMAGE: &str = "quay.io/redhat-developer/test-build-simples2i:latest";
pub const DEFAULT_EXEC_POD_SERVICE_ACCOUNT: &str = "jenkins";
pub const DEFAULT_EXEC_POD_COMMAND: &str = "curl -sS -o /dev/null -w '%{http_code}\\n' http://jenkins/login";
pub const DEFAULT_JOB_LOG_POD_NAME: &str = "jenkins-job-logs";
pub const DEFAULT_JENKINS_URL: &str = "http://jenkins";
pub const SERVICE_ACCOUNT_TOKEN_PATH: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const EXEC_POD_CONTAINER_NAME: &str = "hostexec";
pub const EXEC_POD_RUN_AS_USER: i64 = 65532;
