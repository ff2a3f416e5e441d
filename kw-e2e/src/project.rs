use kube::api::{
    ApiResource,
    DeleteParams,
    DynamicObject,
    GroupVersionKind,
    PostParams,
};
use kw_core::prelude::*;
use tracing::*;

fn project_request_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(PROJECT_API_GROUP, "v1", PROJECT_REQUEST_KIND);
    ApiResource::from_gvk_with_plural(&gvk, PROJECT_REQUEST_PLURAL)
}

fn project_resource() -> ApiResource {
    let gvk = GroupVersionKind::gvk(PROJECT_API_GROUP, "v1", PROJECT_KIND);
    ApiResource::from_gvk_with_plural(&gvk, PROJECT_PLURAL)
}

pub(crate) fn is_already_exists(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(resp) if resp.reason == ALREADY_EXISTS_REASON)
}

// The scenario's namespace.  OpenShift doesn't let ordinary users create namespaces directly, so
// this goes through a ProjectRequest; the Project it produces is removed again by `delete`.
pub struct Project {
    client: kube::Client,
    name: String,
}

impl Project {
    #[instrument(skip(client))]
    pub async fn request(client: kube::Client, name: &str) -> anyhow::Result<Project> {
        let ar = project_request_resource();
        let api: kube::Api<DynamicObject> = kube::Api::all_with(client.clone(), &ar);
        match api.create(&PostParams::default(), &DynamicObject::new(name, &ar)).await {
            Ok(_) => info!("created project {name}"),
            Err(err) if is_already_exists(&err) => warn!("project {name} already exists, reusing it"),
            Err(err) => return Err(err.into()),
        }

        Ok(Project { client, name: name.into() })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn delete(&self) -> EmptyResult {
        let api: kube::Api<DynamicObject> = kube::Api::all_with(self.client.clone(), &project_resource());
        api.delete(&self.name, &DeleteParams::default()).await?;
        info!("deleted project {}", self.name);
        Ok(())
    }
}
