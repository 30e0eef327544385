//! Agent profiles
//!
//! A profile is everything that distinguishes one agent from another: its
//! system prompt, the tools it may call and the task it runs when none is given.
//! The loop itself is shared.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentProfile {
    pub agent_type: String,
    pub name: String,
    pub description: String,
    #[serde(skip)]
    pub system_prompt: String,
    /// Tools the agent may call, in prompt order
    pub tools: Vec<String>,
    pub default_task: Option<String>,
}

impl AgentProfile {
    pub fn new(agent_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            agent_type: agent_type.into(),
            name: name.into(),
            description: String::new(),
            system_prompt: String::new(),
            tools: Vec::new(),
            default_task: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_task(mut self, task: impl Into<String>) -> Self {
        self.default_task = Some(task.into());
        self
    }

    pub fn allows(&self, tool: &str) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

const PATIENT_MONITOR_PROMPT: &str = "You are an autonomous patient monitoring agent for a healthcare provider.

Your goal: monitor patient health and intervene when risks are detected.

Your approach:
1. Retrieve patient data
2. Analyze risk scores to identify high-risk patients
3. Alert the clinical team if critical patients are found
4. Schedule follow-up appointments for at-risk patients
5. Update patient notes with your findings

Your constraints:
- Never access patient data without a valid medical reason
- Always alert humans for critical decisions
- Respect patient privacy
- Escalate to a human when uncertain

Think step by step about what information you need and which tools to use.
Continue until the monitoring task is complete or you need human help.

IMPORTANT: Respond with ONLY a JSON object, no other text.";

const CLINICAL_RESEARCH_PROMPT: &str = "You are a clinical research agent supporting physicians at a healthcare provider.

Your goal: answer clinical questions with evidence from the literature and from comparable patient cases.

Your approach:
1. Search the medical literature for the question at hand
2. Check drug interactions when medications are involved
3. Query similar patient cases to ground the answer in local data
4. Provide a concise, sourced answer

Say clearly when the evidence is insufficient. Never give a diagnosis for a named patient.

IMPORTANT: Respond with ONLY a JSON object, no other text.";

/// Profiles shipped with the crate
pub fn builtin_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new("patient_monitor", "Patient Monitoring Agent")
            .with_description("Monitors patients and alerts the clinical team when health risks are detected")
            .with_system_prompt(PATIENT_MONITOR_PROMPT)
            .with_tools([
                "get_all_patients",
                "get_patient_details",
                "get_patient_risk_scores",
                "alert_clinical_team",
                "schedule_appointment",
                "update_patient_notes",
            ])
            .with_default_task(
                "Monitor all patients for health risks and alert the clinical team if any high-risk patients are found.",
            ),
        AgentProfile::new("clinical_research", "Clinical Research Agent")
            .with_description("Answers clinical questions from the medical literature and similar patient cases")
            .with_system_prompt(CLINICAL_RESEARCH_PROMPT)
            .with_tools([
                "search_medical_literature",
                "check_drug_interactions",
                "query_patient_cases",
            ])
            .with_default_task("Provide a general health overview of the patient population."),
    ]
}
