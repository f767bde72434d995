use crate::state::{InvestigationState, ReflectorAnalysis};

/// Builds the REFLECTOR prompt: trigger context, the three findings
/// buckets, and an explicit inventory of any tool reported unavailable via
/// a structured tool error, with an instruction to hypothesize from
/// whatever remains rather than halting (§4.5 REFLECTOR).
pub fn reflector_prompt(state: &InvestigationState) -> String {
    let findings = state.findings.clone().unwrap_or_default();
    let unavailable: Vec<&str> = state
        .agent_results
        .iter()
        .filter(|(_, outcome)| outcome.is_error())
        .map(|(name, _)| name.as_str())
        .collect();

    let mut prompt = String::new();
    prompt.push_str(&format!("Trigger: {}\n", state.trigger.name));
    if let Some(severity) = &state.trigger.severity {
        prompt.push_str(&format!("Severity: {severity}\n"));
    }
    prompt.push_str(&format!("Infra findings:\n{}\n", findings.infra));
    prompt.push_str(&format!("Logs findings:\n{}\n", findings.logs));
    if let Some(code) = &findings.code {
        prompt.push_str(&format!("Code findings:\n{code}\n"));
    }
    if !unavailable.is_empty() {
        prompt.push_str(&format!(
            "TOOL UNAVAILABILITY NOTICE: the following agents reported unavailable tools: {}\n",
            unavailable.join(", ")
        ));
    }
    prompt.push_str(
        "Form a hypothesis from whatever evidence remains; do not halt due to missing data.\n",
    );
    prompt
}

/// The documented fallback when the oracle is unreachable or returns
/// unparseable output: proceed with a low-confidence hypothesis rather than
/// terminating silently (§7).
pub fn fallback_reflection(state: &InvestigationState) -> ReflectorAnalysis {
    ReflectorAnalysis {
        hypothesis: format!("Unable to reach reasoning oracle; raw findings for {}", state.trigger.name),
        confidence: 0.0,
        discrepancies: vec!["reasoning oracle unavailable".to_string()],
        reasoning: "Falling back to raw agent findings without synthesis.".to_string(),
        recommended_agents: Vec::new(),
        requires_deeper_investigation: false,
    }
}

/// Builds the PLANNER prompt, inlining a runbook (if found) and up to three
/// similar past incidents (if recalled) ahead of the plan request (§4.5
/// PLANNER).
pub fn planner_prompt(
    state: &InvestigationState,
    runbook: Option<&str>,
    similar_incidents: &[String],
) -> String {
    let mut prompt = String::new();
    if let Some(analysis) = &state.reflector_analysis {
        prompt.push_str(&format!("Hypothesis: {}\n", analysis.hypothesis));
        prompt.push_str(&format!("Reasoning: {}\n", analysis.reasoning));
    }
    if let Some(runbook) = runbook {
        prompt.push_str("RELEVANT RUNBOOK FOUND — follow it verbatim:\n");
        prompt.push_str(runbook);
        prompt.push('\n');
    }
    if !similar_incidents.is_empty() {
        prompt.push_str("Similar Past Incidents and Solutions:\n");
        for incident in similar_incidents {
            prompt.push_str(&format!("- {incident}\n"));
        }
    }
    prompt.push_str("Produce a remediation plan.\n");
    prompt
}
