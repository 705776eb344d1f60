//! Scenario execution

use crate::scenario::{Expectation, Operation, Scenario};
use replivault_core::{
    BackupCoordinator, CallContext, CoordinatorConfig, CoordinatorError, CoordinatorSnapshot,
    PrincipalId,
};
use tracing::{info, warn};

/// Options controlling scenario playback
#[derive(Clone, Debug)]
pub struct RunnerOptions {
    /// Block height of the first step
    pub start_block: u64,
    /// Height increment between consecutive steps
    pub block_step: u64,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            start_block: 1,
            block_step: 1,
        }
    }
}

/// Outcome of one executed step
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub index: usize,
    pub caller: String,
    pub op: &'static str,
    pub result: Result<String, CoordinatorError>,
    pub matched: bool,
}

/// Aggregated result of a scenario run
#[derive(Debug)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub outcomes: Vec<StepOutcome>,
    pub snapshot: CoordinatorSnapshot,
}

impl RunReport {
    /// True when every step matched its expectation
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Execute every step of a scenario against a fresh coordinator.
///
/// The runner plays the execution environment: it supplies each step's
/// caller identity and a block counter advancing by `block_step` per step.
pub fn run_scenario(scenario: &Scenario, options: &RunnerOptions) -> RunReport {
    let mut config = CoordinatorConfig::new(scenario.owner.as_str())
        .with_min_replicas(scenario.min_replicas);
    if let Some(ref fallback) = scenario.restore_fallback {
        config = config.with_restore_fallback(fallback.as_str());
    }
    let coordinator = BackupCoordinator::new(config);

    let mut passed = 0;
    let mut failed = 0;
    let mut outcomes = Vec::with_capacity(scenario.steps.len());
    let mut height = options.start_block;

    for (index, step) in scenario.steps.iter().enumerate() {
        let ctx = CallContext::new(step.caller.as_str(), height);
        let result = apply(&coordinator, &ctx, &step.op);
        let matched = matches!(
            (&result, step.expect),
            (Ok(_), Expectation::Ok) | (Err(_), Expectation::Error)
        );

        match &result {
            Ok(outcome) if matched => {
                info!(step = index, caller = %step.caller, op = step.op.name(), %outcome, "step ok")
            }
            Err(error) if matched => {
                info!(step = index, caller = %step.caller, op = step.op.name(), %error, "step rejected as expected")
            }
            Ok(outcome) => {
                warn!(step = index, caller = %step.caller, op = step.op.name(), %outcome, "step succeeded but expected rejection")
            }
            Err(error) => {
                warn!(step = index, caller = %step.caller, op = step.op.name(), %error, "step failed")
            }
        }

        if matched {
            passed += 1;
        } else {
            failed += 1;
        }
        outcomes.push(StepOutcome {
            index,
            caller: step.caller.clone(),
            op: step.op.name(),
            result,
            matched,
        });
        height += options.block_step;
    }

    RunReport {
        passed,
        failed,
        outcomes,
        snapshot: coordinator.snapshot(),
    }
}

fn apply(
    coordinator: &BackupCoordinator,
    ctx: &CallContext,
    op: &Operation,
) -> Result<String, CoordinatorError> {
    match op {
        Operation::RegisterNode { capacity } => {
            coordinator.register_node(ctx, *capacity)?;
            Ok(format!("node {} registered with capacity {capacity}", ctx.caller))
        }
        Operation::SetNodeActive { active } => {
            coordinator.set_node_active(ctx, *active)?;
            Ok(format!("node {} active = {active}", ctx.caller))
        }
        Operation::CreateBackupRequest {
            file_hash,
            file_size,
            priority,
            required_replicas,
            reward,
        } => {
            let id = coordinator.create_backup_request(
                ctx,
                file_hash.as_str(),
                *file_size,
                *priority,
                *required_replicas,
                *reward,
            )?;
            Ok(format!("backup request {id} created"))
        }
        Operation::AssignBackup { backup_id, node } => {
            coordinator.assign_backup(ctx, *backup_id, &PrincipalId::new(node.as_str()))?;
            Ok(format!("backup {backup_id} assigned to {node}"))
        }
        Operation::ReportCompletion {
            backup_id,
            backup_hash,
        } => {
            coordinator.report_backup_completion(ctx, *backup_id, backup_hash.as_str())?;
            Ok(format!("backup {backup_id} completed by {}", ctx.caller))
        }
        Operation::ReportFailure { backup_id } => {
            coordinator.report_backup_failure(ctx, *backup_id)?;
            Ok(format!("backup {backup_id} failed at {}", ctx.caller))
        }
        Operation::VerifyIntegrity {
            file_hash,
            verified,
        } => {
            coordinator.verify_integrity(ctx, file_hash, *verified)?;
            Ok(format!("location {file_hash}@{} verified = {verified}", ctx.caller))
        }
        Operation::CreateRestoreRequest {
            file_hash,
            preferred_node,
            reward,
        } => {
            let preferred = preferred_node
                .as_ref()
                .map(|node| PrincipalId::new(node.as_str()));
            let id =
                coordinator.create_restore_request(ctx, file_hash.as_str(), preferred, *reward)?;
            Ok(format!("restore request {id} created"))
        }
        Operation::CompleteRestore { restore_id } => {
            coordinator.complete_restore(ctx, *restore_id)?;
            Ok(format!("restore {restore_id} completed"))
        }
        Operation::SetMinReplicas { min } => {
            coordinator.set_min_replicas(ctx, *min)?;
            Ok(format!("minimum replicas set to {min}"))
        }
    }
}
