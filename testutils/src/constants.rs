pub const TEST_NAMESPACE: &str = "test-namespace";
pub const TEST_TEMPLATE_INSTANCE: &str = "the-template-instance";
pub const TEST_BUILD_CONFIG: &str = "the-build-config";
pub const TEST_BUILD: &str = "the-build-config-1";
pub const TEST_POD: &str = "the-pod";
pub const TEST_CONTAINER: &str = "the-container";
pub const TEST_RESOURCE_VERSION: &str = "12345";
