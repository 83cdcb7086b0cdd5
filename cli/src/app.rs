//! Dispatch layer: look up the injector factory, bind args, drive the
//! validate/inject/recover lifecycle and persist the experiment record
//! after every phase transition.

use faultd_core::api::{
    instantiate, AgentContext, AgentError, ExperimentPhase, ExperimentRecord, Injector,
    InjectorRegistry, PhaseTransition, TargetInfo,
};

use crate::commands::cli::{CommonArgs, OutputFormat};

pub struct InjectRequest {
    pub target: &'static str,
    pub fault: &'static str,
    pub common: CommonArgs,
    pub args: serde_json::Value,
}

/// Run one inject lifecycle. Prints the experiment uid (or the full record
/// as JSON) on success.
pub async fn run_inject(
    ctx: &AgentContext,
    registry: &InjectorRegistry,
    req: InjectRequest,
    format: OutputFormat,
) -> Result<(), AgentError> {
    let uid = req
        .common
        .uid
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let info = TargetInfo {
        uid: uid.clone(),
        container_runtime: req.common.container_runtime.clone(),
        container_id: req.common.container_id.clone(),
        timeout: req.common.timeout.clone(),
    };

    let mut injector = instantiate(registry, ctx, req.target, req.fault)?;
    injector.set_info(info.clone());
    injector.set_args(req.args)?;

    let store = ctx.experiment_store()?;
    let mut record = ExperimentRecord::new(req.target, req.fault, info, injector.get_args()?);
    store.save(&record)?;
    tracing::info!(uid = %uid, target = req.target, fault = req.fault, "experiment created");

    if let Err(e) = injector.validate().await {
        store.transition(
            &mut record,
            ExperimentPhase::ValidationFailed,
            Some(e.to_string()),
        )?;
        return Err(e);
    }
    store.transition(&mut record, ExperimentPhase::Validated, None)?;

    match injector.inject().await {
        Ok(()) => {
            record.runtime = injector.get_runtime()?;
            store.transition(&mut record, ExperimentPhase::Injected, None)?;
        }
        Err(e) => {
            record.runtime = injector.get_runtime()?;
            if matches!(e, AgentError::InjectCompensated { .. }) {
                // Compensation failed: rule files may remain, so the record
                // must land in a phase `recover <uid>` acts on.
                store.transition(&mut record, ExperimentPhase::Injected, None)?;
                store.transition(
                    &mut record,
                    ExperimentPhase::PartiallyRecovered,
                    Some(e.to_string()),
                )?;
            } else {
                // Compensation cleaned up; keep the runtime the injector saw
                // and the failure text so the record explains itself.
                record.message = Some(e.to_string());
                record.updated_at = chrono::Utc::now();
                store.save(&record)?;
            }
            return Err(e);
        }
    }

    match format {
        OutputFormat::Json => print_record(&record)?,
        OutputFormat::Text => println!("{uid}"),
    }
    Ok(())
}

/// Reverse an experiment by id, re-binding the injector from the persisted
/// record. Safe to call repeatedly.
pub async fn run_recover(
    ctx: &AgentContext,
    registry: &InjectorRegistry,
    uid: &str,
) -> Result<(), AgentError> {
    let store = ctx.experiment_store()?;
    let mut record = store.load(uid)?;

    match record.phase {
        ExperimentPhase::Recovered => {
            tracing::info!(uid = %uid, "experiment already recovered");
            return Ok(());
        }
        ExperimentPhase::Injected | ExperimentPhase::PartiallyRecovered => {}
        phase => {
            // nothing was injected, so there is nothing to undo
            tracing::info!(uid = %uid, ?phase, "no injected state to recover");
            return Ok(());
        }
    }

    let mut injector = bind_from_record(ctx, registry, &record)?;

    match injector.recover().await {
        Ok(()) => {
            store.transition(&mut record, ExperimentPhase::Recovered, None)?;
            tracing::info!(uid = %uid, "experiment recovered");
            Ok(())
        }
        Err(e) => {
            store.transition(
                &mut record,
                ExperimentPhase::PartiallyRecovered,
                Some(e.to_string()),
            )?;
            Err(e)
        }
    }
}

pub fn run_query(
    ctx: &AgentContext,
    uid: Option<&str>,
    format: OutputFormat,
) -> Result<(), AgentError> {
    let store = ctx.experiment_store()?;

    let records = match uid {
        Some(uid) => vec![store.load(uid)?],
        None => store.list()?,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&records)
                .map_err(|e| AgentError::Persistence(e.to_string()))?;
            println!("{json}");
        }
        OutputFormat::Text => {
            for r in &records {
                println!(
                    "{}  {}/{}  phase={}  created={}{}",
                    r.uid,
                    r.target,
                    r.fault,
                    PhaseTransition::phase_description(r.phase),
                    r.created_at.to_rfc3339(),
                    r.message
                        .as_deref()
                        .map(|m| format!("  message={m}"))
                        .unwrap_or_default()
                );
            }
        }
    }
    Ok(())
}

fn bind_from_record(
    ctx: &AgentContext,
    registry: &InjectorRegistry,
    record: &ExperimentRecord,
) -> Result<Box<dyn Injector>, AgentError> {
    let mut injector = instantiate(registry, ctx, &record.target, &record.fault)?;
    injector.set_info(record.info.clone());
    injector.set_args(record.args.clone())?;
    injector.set_runtime(record.runtime.clone())?;
    Ok(injector)
}

fn print_record(record: &ExperimentRecord) -> Result<(), AgentError> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| AgentError::Persistence(e.to_string()))?;
    println!("{json}");
    Ok(())
}
