//! Mapping of human-supplied names onto platform identifiers.
//!
//! Every lookup re-reads the platform lists; nothing is cached between runs.

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::{ConfigId, ConfigSummary, Member, ProjectId};
use crate::error::{ResolutionError, Result};
use crate::port::ControlPlane;

/// Identifier of the project named `name`.
///
/// # Errors
///
/// Returns [`ResolutionError::ProjectNotFound`] when no project has that name.
pub async fn project_id<C: ControlPlane + ?Sized>(plane: &C, name: &str) -> Result<ProjectId> {
    let project = plane
        .list_projects()
        .await?
        .into_iter()
        .find(|project| project.name == name)
        .ok_or_else(|| ResolutionError::ProjectNotFound {
            name: name.to_string(),
        })?;
    debug!(project = name, project_id = %project.id, "Project resolved");
    Ok(project.id)
}

/// Identifier of the stack named `name` within a project.
///
/// # Errors
///
/// Returns [`ResolutionError::StackNotFound`] when no config has that name.
pub async fn stack_id<C: ControlPlane + ?Sized>(
    plane: &C,
    project: &ProjectId,
    name: &str,
) -> Result<ConfigId> {
    let configs = plane.get_project_configs(project).await?;
    // a stack-model config wins over a same-named member
    let found = configs
        .iter()
        .find(|config| config.name == name && config.is_stack())
        .or_else(|| configs.iter().find(|config| config.name == name))
        .ok_or_else(|| ResolutionError::StackNotFound {
            name: name.to_string(),
        })?;
    debug!(stack = name, stack_id = %found.id, "Stack resolved");
    Ok(found.id.clone())
}

/// Declared members of a stack, in declared order.
///
/// # Errors
///
/// Returns the control-plane error when the stack cannot be read.
pub async fn config_ids_for_stack<C: ControlPlane + ?Sized>(
    plane: &C,
    project: &ProjectId,
    stack: &ConfigId,
) -> Result<Vec<Member>> {
    let unit = plane.get_config(project, stack).await?;
    debug!(stack_id = %stack, members = unit.members.len(), "Stack members loaded");
    Ok(unit.members)
}

/// Strip a `"<stack>-"` or `"<stack> -"` prefix some deployment surfaces
/// add to member names.
#[must_use]
pub fn strip_stack_prefix<'a>(name: &'a str, stack: &str) -> &'a str {
    [format!("{stack}-"), format!("{stack} -")]
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix.as_str()))
        .unwrap_or(name)
}

/// Resolve an explicit member order to configuration ids, in that order.
///
/// Stack configs are ignored. A listed config matches a requested name when
/// its name, with any stack prefix removed, equals it. Exactly one config
/// must match each requested name.
///
/// # Errors
///
/// Returns [`ResolutionError::ConfigNotFound`] when fewer or more configs
/// match than were requested.
pub async fn config_ids<C: ControlPlane + ?Sized>(
    plane: &C,
    project: &ProjectId,
    stack_name: &str,
    order: &[String],
) -> Result<Vec<Member>> {
    let configs = plane.get_project_configs(project).await?;
    Ok(match_order(&configs, stack_name, order)?)
}

fn match_order(
    configs: &[ConfigSummary],
    stack_name: &str,
    order: &[String],
) -> std::result::Result<Vec<Member>, ResolutionError> {
    let mut matches: BTreeMap<&str, Vec<Member>> = BTreeMap::new();
    for config in configs {
        if config.is_stack() {
            debug!(config = %config.name, "Skipping stack");
            continue;
        }
        let short = strip_stack_prefix(&config.name, stack_name);
        if let Some(requested) = order.iter().find(|name| name.as_str() == short) {
            let member = Member::new(config.name.clone(), config.id.clone());
            let found = matches.entry(requested.as_str()).or_default();
            if !found.contains(&member) {
                found.push(member);
            }
        }
    }

    let total: usize = matches.values().map(Vec::len).sum();
    let each_unique = order
        .iter()
        .all(|name| matches.get(name.as_str()).is_some_and(|found| found.len() == 1));
    if !each_unique || total != order.len() {
        let missing = order
            .iter()
            .filter(|name| !matches.contains_key(name.as_str()))
            .cloned()
            .collect();
        let unexpected = matches
            .values()
            .filter(|found| found.len() > 1)
            .flat_map(|found| found.iter().map(|member| member.name.clone()))
            .collect();
        return Err(ResolutionError::ConfigNotFound {
            expected: order.to_vec(),
            missing,
            unexpected,
        });
    }

    Ok(order
        .iter()
        .filter_map(|name| matches.get(name.as_str()).and_then(|found| found.first()))
        .cloned()
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConfigUnit, State};
    use crate::error::Error;
    use crate::testkit::FakeControlPlane;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn plane() -> FakeControlPlane {
        FakeControlPlane::new()
            .with_project("p1", "demo")
            .with_stack("p1", "s1", "infra", &[("net", "c-net"), ("db", "c-db"), ("app", "c-app")])
            .with_unit("p1", ConfigUnit::new("c-net", "net", State::Draft), "infra-net")
            .with_unit("p1", ConfigUnit::new("c-db", "db", State::Draft), "infra -db")
            .with_unit("p1", ConfigUnit::new("c-app", "app", State::Draft), "app")
    }

    #[test]
    fn strips_either_prefix_form() {
        assert_eq!(strip_stack_prefix("infra-net", "infra"), "net");
        assert_eq!(strip_stack_prefix("infra -net", "infra"), "net");
        assert_eq!(strip_stack_prefix("net", "infra"), "net");
        assert_eq!(strip_stack_prefix("other-net", "infra"), "other-net");
    }

    #[tokio::test]
    async fn resolves_names_and_ids() {
        let plane = plane();
        let project = project_id(&plane, "demo").await.unwrap();
        assert_eq!(project.as_str(), "p1");

        let stack = stack_id(&plane, &project, "infra").await.unwrap();
        assert_eq!(stack.as_str(), "s1");

        let members = config_ids_for_stack(&plane, &project, &stack).await.unwrap();
        let names: Vec<_> = members.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["net", "db", "app"]);
    }

    #[tokio::test]
    async fn unknown_names_are_resolution_errors() {
        let plane = plane();
        assert!(matches!(
            project_id(&plane, "nope").await,
            Err(Error::Resolution(ResolutionError::ProjectNotFound { .. }))
        ));
        assert!(matches!(
            stack_id(&plane, &ProjectId::new("p1"), "nope").await,
            Err(Error::Resolution(ResolutionError::StackNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn explicit_order_is_preserved() {
        let plane = plane();
        let members = config_ids(&plane, &ProjectId::new("p1"), "infra", &order(&["app", "net", "db"]))
            .await
            .unwrap();
        let ids: Vec<_> = members.iter().map(|m| m.config_id.as_str()).collect();
        assert_eq!(ids, vec!["c-app", "c-net", "c-db"]);
    }

    #[tokio::test]
    async fn fewer_found_than_requested_fails() {
        let plane = plane();
        let result = config_ids(&plane, &ProjectId::new("p1"), "infra", &order(&["net", "db", "cache"])).await;
        match result {
            Err(Error::Resolution(ResolutionError::ConfigNotFound { missing, unexpected, .. })) => {
                assert_eq!(missing, vec!["cache"]);
                assert!(unexpected.is_empty());
            }
            other => panic!("expected ConfigNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn more_found_than_requested_fails() {
        let plane = plane().with_unit("p1", ConfigUnit::new("c-net2", "net", State::Draft), "net");
        let result = config_ids(&plane, &ProjectId::new("p1"), "infra", &order(&["net", "db"])).await;
        match result {
            Err(Error::Resolution(ResolutionError::ConfigNotFound { missing, unexpected, .. })) => {
                assert!(missing.is_empty());
                assert_eq!(unexpected, vec!["infra-net", "net"]);
            }
            other => panic!("expected ConfigNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_cannot_stand_in_for_missing_name() {
        let plane = plane().with_unit("p1", ConfigUnit::new("c-net2", "net", State::Draft), "net");
        let result = config_ids(&plane, &ProjectId::new("p1"), "infra", &order(&["net", "cache"])).await;
        match result {
            Err(Error::Resolution(ResolutionError::ConfigNotFound { missing, unexpected, .. })) => {
                assert_eq!(missing, vec!["cache"]);
                assert_eq!(unexpected, vec!["infra-net", "net"]);
            }
            other => panic!("expected ConfigNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stack_configs_never_match() {
        let plane = plane();
        let result = config_ids(&plane, &ProjectId::new("p1"), "infra", &order(&["infra"])).await;
        assert!(matches!(
            result,
            Err(Error::Resolution(ResolutionError::ConfigNotFound { .. }))
        ));
    }
}
