//! Explicit runtime settings for one invocation.
//!
//! [`DeploySettings`] is built once at process entry (see the `cli` crate) and
//! handed by reference to every component. Nothing in the domain reads
//! configuration from ambient state.

use serde::{Deserialize, Serialize};

use crate::{CommandSpec, ContainerName, DeployError, TargetHost};

/// Container (data bag) that holds every deploy record.
pub const DEFAULT_CONTAINER: &str = "deploy";

/// Status an artifact must move into for a deployment to start.
pub const DEFAULT_DEPLOY_STATUS: &str = "Deploy";

/// Flex-field name carrying the target host.
pub const DEFAULT_TARGET_FIELD: &str = "Deploy To";

/// Flex-field name carrying the release identifier.
pub const DEFAULT_RELEASE_FIELD: &str = "FRSID";

/// Node search query; `{host}` is replaced with the target host.
pub const DEFAULT_QUERY_TEMPLATE: &str = "name:{host}";

/// Reload a running chef-client, or start a one-shot run when none is running.
pub const DEFAULT_REMOTE_COMMAND: &str = "[ -e /var/run/chef/client.pid ] && sudo /usr/bin/pkill -USR1 chef-client || sudo /usr/bin/chef-client --once";

const HOST_PLACEHOLDER: &str = "{host}";

// ---------------------------------------------------------------------------

/// Names of the two flex fields the extractor looks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexFieldNames {
    /// Flex field whose value is the target host.
    pub target_host: String,
    /// Flex field whose value is the release identifier.
    pub release_id: String,
}

impl Default for FlexFieldNames {
    fn default() -> Self {
        Self {
            target_host: DEFAULT_TARGET_FIELD.to_string(),
            release_id: DEFAULT_RELEASE_FIELD.to_string(),
        }
    }
}

/// Template for the remote configuration-management command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommand {
    /// Node search query containing a `{host}` placeholder.
    pub query_template: String,
    /// Shell command run on the matched node.
    pub command: String,
}

impl RemoteCommand {
    /// Renders the command for `host`.
    pub fn render(&self, host: &TargetHost) -> CommandSpec {
        CommandSpec {
            query: self.query_template.replace(HOST_PLACEHOLDER, host.as_str()),
            command: self.command.clone(),
        }
    }
}

impl Default for RemoteCommand {
    fn default() -> Self {
        Self {
            query_template: DEFAULT_QUERY_TEMPLATE.to_string(),
            command: DEFAULT_REMOTE_COMMAND.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------

/// Everything the core needs to know about its environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    /// Container holding the deploy records.
    pub container: ContainerName,
    /// Status that starts a deployment.
    pub deploy_status: String,
    /// Flex-field names to extract.
    pub flex_fields: FlexFieldNames,
    /// Remote command issued by the trigger.
    pub remote: RemoteCommand,
}

impl DeploySettings {
    /// Checks the settings for values that would make every invocation fail
    /// or misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`DeployError::Configuration`] describing the first problem found.
    pub fn validate(&self) -> Result<(), DeployError> {
        let fail = |message: &str| {
            Err(DeployError::Configuration {
                message: message.to_string(),
            })
        };

        if self.deploy_status.is_empty() {
            return fail("deploy status must not be empty");
        }
        if self.flex_fields.target_host.is_empty() || self.flex_fields.release_id.is_empty() {
            return fail("flex field names must not be empty");
        }
        if self.flex_fields.target_host == self.flex_fields.release_id {
            return fail("target host and release flex fields must have different names");
        }
        if !self.remote.query_template.contains(HOST_PLACEHOLDER) {
            return fail("remote query template must contain '{host}'");
        }
        if self.remote.command.trim().is_empty() {
            return fail("remote command must not be empty");
        }
        Ok(())
    }
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            container: ContainerName::new(DEFAULT_CONTAINER).expect("default container is non-empty"),
            deploy_status: DEFAULT_DEPLOY_STATUS.to_string(),
            flex_fields: FlexFieldNames::default(),
            remote: RemoteCommand::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = DeploySettings::default();

        assert!(settings.validate().is_ok());
        assert_eq!(settings.container.as_str(), "deploy");
        assert_eq!(settings.deploy_status, "Deploy");
    }

    #[test]
    fn test_render_substitutes_host_into_query() {
        let host = TargetHost::new("web1.example.com").unwrap();
        let spec = RemoteCommand::default().render(&host);

        assert_eq!(spec.query, "name:web1.example.com");
        assert_eq!(spec.command, DEFAULT_REMOTE_COMMAND);
    }

    #[test]
    fn test_query_without_placeholder_is_rejected() {
        let mut settings = DeploySettings::default();
        settings.remote.query_template = "name:web1".into();

        assert!(matches!(
            settings.validate(),
            Err(DeployError::Configuration { .. })
        ));
    }

    #[test]
    fn test_identical_flex_field_names_are_rejected() {
        let mut settings = DeploySettings::default();
        settings.flex_fields.release_id = settings.flex_fields.target_host.clone();

        assert!(settings.validate().is_err());
    }
}
