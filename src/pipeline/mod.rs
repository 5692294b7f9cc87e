//! The decision pipeline (SPEC_FULL.md §2, §4): a short DAG with early
//! exit. `decide()` is the library's sole public entry point.

pub mod checkpoint;
pub mod custom_rules;
pub mod dispatcher;
pub mod injection;
pub mod instant_allow;
pub mod llm;
pub mod path_sensitivity;
pub mod response;
pub mod url_layer;

use crate::config::Config;
use crate::pipeline::llm::LlmClient;
use crate::types::{
    Decision, DecisionSource, ReviewVerdict, TriageClassification, DEFAULT_TIMEOUT_SECONDS,
};

/// Runs the full decision pipeline for a single request. Never panics,
/// never returns an error: every failure mode along the way is coerced to
/// a conservative `Decision` before it crosses this boundary (SPEC_FULL.md
/// §7).
pub async fn decide(
    request: &crate::request::Request,
    config: &Config,
    llm: Option<&dyn LlmClient>,
) -> Decision {
    if let Some(decision) = dispatcher::dispatch(request, config) {
        return decision;
    }

    let command = request.command();

    if let Some(decision) = custom_rules::evaluate(
        command,
        &config.custom_patterns.allow,
        &config.custom_patterns.block,
    ) {
        return decision;
    }

    if instant_allow::is_instant_allow(command) {
        return Decision::allow(DecisionSource::InstantAllow, "read-only, hook-free git command");
    }

    if let Some(pattern) = crate::patterns::high_risk::scan(command) {
        return Decision::deny(DecisionSource::HighRisk, pattern.description.to_string())
            .with_user_message(response::sensitive_file_message(
                "[HIGH RISK]",
                pattern.description,
                pattern.risk,
                pattern.legitimate_uses,
                DEFAULT_TIMEOUT_SECONDS,
            ));
    }

    let Some(cp) = checkpoint::classify(command) else {
        return Decision::allow(DecisionSource::NoCheckpoint, "no checkpoint matched");
    };

    if cp.kind == crate::types::CheckpointKind::Network {
        let analysis = url_layer::analyze(command, &config.trusted_domains);
        if analysis.eligible_for_short_circuit() {
            return Decision::allow(DecisionSource::TrustedDomain, "all URLs resolve to trusted domains")
                .with_checkpoint(cp);
        }
    }

    let has_credential = config.resolve_credential().is_some();
    let Some(llm) = llm.filter(|_| has_credential) else {
        return Decision::deny(DecisionSource::Checkpoint, cp.description.clone())
            .with_checkpoint(cp.clone())
            .with_user_message(format!(
                "[REVIEW REQUIRED] {}\n\nNo LLM reviewer is configured, so this requires your \
                 explicit approval.",
                cp.description
            ));
    };

    let outcome = llm::run_cascade(llm, &config.models.triage, &config.models.review, command, &cp).await;

    match outcome.review {
        Some(review) => match review.verdict {
            ReviewVerdict::Allow => Decision::allow(DecisionSource::Sonnet, review.reason).with_checkpoint(cp),
            ReviewVerdict::Block => {
                let mut decision = Decision::deny(DecisionSource::Sonnet, review.reason).with_checkpoint(cp);
                if let Some(msg) = review.user_message {
                    decision = decision.with_user_message(msg);
                }
                decision
            }
            ReviewVerdict::AskUser => {
                let mut decision = Decision::deny(DecisionSource::Sonnet, review.reason).with_checkpoint(cp);
                decision = decision.with_user_message(
                    review.user_message.unwrap_or_else(|| {
                        "This command needs your review before it can proceed.".to_string()
                    }),
                );
                decision
            }
        },
        None => {
            let triage = outcome.triage.expect("cascade always returns a triage result");
            match triage.classification {
                TriageClassification::SelfHandle => {
                    Decision::allow(DecisionSource::Haiku, triage.reason).with_checkpoint(cp)
                }
                TriageClassification::Block => {
                    Decision::deny(DecisionSource::Haiku, triage.reason).with_checkpoint(cp)
                }
                TriageClassification::Escalate => {
                    unreachable!("run_cascade always attaches a review result on ESCALATE")
                }
            }
        }
    }
}
