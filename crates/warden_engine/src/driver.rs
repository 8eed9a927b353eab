//! The lifecycle driver (§4.6, §4.7): deploy/undeploy phase sequencing,
//! rollback-aware event dispatch, and the built-in `link`/`unlink` calls
//! that run around `create`/`delete`.

use std::future::Future;

use hashbrown::HashMap;
use tracing::{debug, error, info};
use warden_graph::{Node, NodeId, Value};
use warden_ops::OperationError;

use crate::context::Context;
use crate::error::DriverError;
use crate::status::Status;

const STANDARD_EVENTS_ARE_DESTRUCTIVE: [(&str, bool); 5] = [
    ("create", false),
    ("configure", false),
    ("start", false),
    ("stop", true),
    ("delete", true),
];

fn is_destructive(event: &str) -> bool {
    STANDARD_EVENTS_ARE_DESTRUCTIVE
        .iter()
        .find(|(name, _)| *name == event)
        .is_some_and(|(_, destructive)| *destructive)
}

/// Runs `deploy`: the `create`, `configure`, `start` phases in order, each
/// phase visiting every node in the plan's global sequence.
///
/// Precondition: [`Context::status`] must be `Pending`. Sets `Running`
/// while executing, then `Completed` on a clean run or `Failed` on the
/// first error. If rollback is enabled, a `Failed` outcome is swallowed —
/// the caller is expected to call [`undeploy`] to unwind what was created.
///
/// # Errors
///
/// Returns [`DriverError::BadState`] if not `Pending`, or propagates the
/// first operation/planner error when rollback is disabled.
pub async fn deploy(ctx: &Context) -> Result<(), DriverError> {
    if ctx.status() != Status::Pending {
        return Err(DriverError::BadState { actual: ctx.status() });
    }
    info!(deployment = ctx.name(), "starting deployment");

    let sequence = ctx.plan()?.global_sequence();
    ctx.set_status(Status::Running);

    let mut failure = None;
    'phases: for event in ["create", "configure", "start"] {
        for &node_id in &sequence {
            if let Err(err) = run_event(ctx, node_id, event).await {
                failure = Some(err);
                break 'phases;
            }
        }
    }

    match failure {
        None => {
            ctx.set_status(Status::Completed);
            info!(deployment = ctx.name(), "deployment completed");
            Ok(())
        }
        Some(err) => {
            ctx.set_status(Status::Failed);
            error!(deployment = ctx.name(), %err, "deployment failed");
            if ctx.rollback_enabled() {
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

/// Runs `undeploy`: `delete` then `stop`, each over the plan's global
/// sequence; the concatenated task list is awaited in reverse order, so
/// dependents are torn down before the prerequisites they depend on.
///
/// Precondition: status is `Completed`/`Failed`, or rollback is enabled.
/// At least one node must have been provisioned. On success, status
/// returns to `Pending` regardless of whether the teardown loop failed.
///
/// # Errors
///
/// Returns [`DriverError::NotDestructible`] or
/// [`DriverError::NodesNotProvisioned`] if the preconditions aren't met,
/// or propagates the first error encountered while tearing down (always,
/// independent of the rollback flag).
pub async fn undeploy(ctx: &Context) -> Result<(), DriverError> {
    info!(deployment = ctx.name(), "starting teardown");
    let sequence = ctx.plan()?.global_sequence();

    let is_able = if ctx.rollback_enabled() {
        true
    } else {
        ctx.status().available_for_destruction()
    };
    if !is_able {
        return Err(DriverError::NotDestructible { actual: ctx.status() });
    }
    if !ctx.any_node_provisioned() {
        return Err(DriverError::NodesNotProvisioned);
    }

    let mut tasks: Vec<(NodeId, &str)> = Vec::with_capacity(sequence.len() * 2);
    for event in ["delete", "stop"] {
        tasks.extend(sequence.iter().map(|&node_id| (node_id, event)));
    }
    tasks.reverse();

    let mut result = Ok(());
    for (node_id, event) in tasks {
        if let Err(err) = run_event(ctx, node_id, event).await {
            error!(deployment = ctx.name(), %err, "teardown failed");
            result = Err(err);
            break;
        }
    }

    ctx.set_status(Status::Pending);
    if result.is_ok() {
        info!(deployment = ctx.name(), "deployment destroyed");
    }
    result
}

async fn run_event(ctx: &Context, node_id: NodeId, event: &str) -> Result<(), DriverError> {
    let node = &ctx.nodes()[node_id.index()];
    debug!(node = node.name(), event, "running lifecycle event");

    if is_destructive(event) && ctx.rollback_enabled() && !node.is_provisioned() {
        info!(
            node = node.name(),
            event, "skipping event, node was never provisioned and rollback is enabled"
        );
        return Ok(());
    }

    let outcome = run_event_body(ctx, node, node_id, event).await;
    if outcome.is_err() {
        node.set_provisioned(false);
    }
    outcome
}

async fn run_event_body(ctx: &Context, node: &Node, node_id: NodeId, event: &str) -> Result<(), DriverError> {
    match event {
        "create" => {
            for other_id in other_prerequisites(ctx, node_id)? {
                run_relationship(ctx, node, &ctx.nodes()[other_id.index()], "link").await?;
            }
            run_standard(ctx, node, "create").await?;
            node.set_provisioned(true);
            Ok(())
        }
        "delete" => {
            run_standard(ctx, node, "delete").await?;
            for other_id in other_prerequisites(ctx, node_id)? {
                run_relationship(ctx, node, &ctx.nodes()[other_id.index()], "unlink").await?;
            }
            node.set_provisioned(false);
            Ok(())
        }
        _ => run_standard(ctx, node, event).await,
    }
}

fn other_prerequisites(ctx: &Context, node_id: NodeId) -> Result<Vec<NodeId>, DriverError> {
    Ok(ctx
        .plan()?
        .prerequisites_for(node_id)
        .iter()
        .filter(|&&id| id != node_id)
        .copied()
        .collect())
}

async fn run_standard(ctx: &Context, node: &Node, event: &str) -> Result<(), DriverError> {
    let Some(op) = node.standard_event(event) else {
        return Ok(());
    };
    let Some(reference) = &op.implementation else {
        return Ok(());
    };
    let implementation = ctx.registry().resolve_standard(reference)?;
    run_and_wrap(reference, implementation.call(node, &op.inputs)).await
}

async fn run_relationship(ctx: &Context, source: &Node, target: &Node, event: &str) -> Result<(), DriverError> {
    let (reference, inputs) = resolve_relationship_event(ctx, source, target, event);
    let implementation = ctx.registry().resolve_relationship(&reference)?;
    run_and_wrap(&reference, implementation.call(source, target, &inputs)).await
}

async fn run_and_wrap(
    reference: &str,
    future: impl Future<Output = Result<(), Box<dyn std::error::Error>>>,
) -> Result<(), DriverError> {
    future.await.map_err(|source| {
        DriverError::Operation(OperationError::Failed {
            reference: reference.to_string(),
            source,
        })
    })
}

fn resolve_relationship_event(
    ctx: &Context,
    source: &Node,
    target: &Node,
    event: &str,
) -> (String, HashMap<String, Value>) {
    if let Some(requirement) = ctx.requirement_toward(source, target.name()) {
        if let Some(relationship_name) = requirement.relationship() {
            if let Some(relationship_type) = ctx.relationship_type(relationship_name) {
                if let Some(op) = relationship_type.configure.get(event) {
                    if let Some(implementation) = &op.implementation {
                        return (implementation.clone(), op.inputs.clone());
                    }
                }
            }
        }
    }
    let reference = match event {
        "link" => warden_ops::noop::LINK_REFERENCE,
        "unlink" => warden_ops::noop::UNLINK_REFERENCE,
        _ => unreachable!("relationship events are only ever \"link\" or \"unlink\""),
    };
    (reference.to_string(), HashMap::new())
}
