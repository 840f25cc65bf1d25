//! Mentor — career strategy, skill gaps, growth planning.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handlers::{AgentReply, Handler, HandlerInput, context_text};
use crate::llm::{Gateway, TaskHint};
use crate::router::HandlerKind;

const MENTOR_SYSTEM: &str = "\
You are the career handler of a personal assistant.

Your job:
- Be a brutally honest career strategist, not a cheerleader
- Track skills against target roles and identify real gaps
- Suggest what to BUILD for maximum career leverage
- Keep the user focused: fewer projects finished beats more projects started
- Ground advice in the user's actual projects when they are relevant";

const SKILL_GAP_PROMPT: &str = "\
Analyze the skill gap described in this request.

Request: {message}
Active projects:
{projects}

Provide:
1. MATCH SCORE (0-100) with brief reasoning
2. CRITICAL GAPS (must fix in 3 months)
3. NICE-TO-HAVE GAPS (6-12 month horizon)
4. WHAT TO BUILD NEXT (one specific project that fills the most gaps)
5. HONEST ASSESSMENT - is the target realistic?

Be direct. No sugarcoating.";

const WEEKLY_CHECKIN_PROMPT: &str = "\
Run a weekly career check-in from this request.

Request: {message}
Active projects:
{projects}
Pending tasks:
{tasks}

Provide:
1. REALITY CHECK - movement toward the goal this week? (Yes/No/Partial)
2. PATTERN ALERT - any recurring issue (overbuilding, distraction)
3. NEXT WEEK FOCUS - single most important career action
4. MOMENTUM SCORE (1-10) with brief explanation

Be a tough but fair mentor.";

const JOB_ANALYSIS_PROMPT: &str = "\
Analyze the job opportunity described in this request.

Request: {message}
Active projects:
{projects}

Analyze:
1. FIT SCORE (0-100)
2. MATCHING SKILLS
3. MISSING SKILLS (be specific)
4. RED FLAGS
5. INTERVIEW PREP - top 3 technical topics to study
6. APPLY OR SKIP - with a clear reason";

const RESUME_REVIEW_PROMPT: &str = "\
Review the resume/portfolio material in this request.

Request: {message}
Active projects:
{projects}

Provide:
1. STRONGEST CLAIMS - what stands out
2. WEAK OR VAGUE LINES - rewrite each one
3. MISSING EVIDENCE - projects or numbers to add
4. ONE-PARAGRAPH POSITIONING - how this person should describe themselves";

const GOAL_TRACKING_PROMPT: &str = "\
Review goal progress from this request.

Request: {message}
Active projects:
{projects}
Pending tasks:
{tasks}

Provide:
1. STATUS per goal mentioned (on track / drifting / stalled)
2. THE ONE BLOCKING FACTOR that matters most
3. CONCRETE NEXT STEP for the highest-leverage goal";

pub struct MentorHandler {
    gateway: Arc<Gateway>,
}

impl MentorHandler {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    fn template_for(action: &str) -> &'static str {
        match action {
            "skill_gap" => SKILL_GAP_PROMPT,
            "weekly_checkin" => WEEKLY_CHECKIN_PROMPT,
            "job_analysis" => JOB_ANALYSIS_PROMPT,
            "resume_review" => RESUME_REVIEW_PROMPT,
            "goal_tracking" => GOAL_TRACKING_PROMPT,
            _ => "{message}",
        }
    }
}

#[async_trait]
impl Handler for MentorHandler {
    fn kind(&self) -> HandlerKind {
        HandlerKind::Mentor
    }

    async fn handle(&self, input: &HandlerInput) -> Result<AgentReply, HandlerError> {
        let prompt = Self::template_for(input.action)
            .replace("{message}", &input.message)
            .replace(
                "{projects}",
                context_text(&input.context, "projects", "No active projects found."),
            )
            .replace(
                "{tasks}",
                context_text(&input.context, "tasks", "No pending tasks."),
            );

        let response = self
            .gateway
            .complete(&prompt, Some(MENTOR_SYSTEM), TaskHint::CareerAnalysis, None)
            .await?;
        Ok(AgentReply::ok(HandlerKind::Mentor, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mentor_action_has_a_template() {
        for action in [
            "skill_gap",
            "weekly_checkin",
            "job_analysis",
            "resume_review",
            "goal_tracking",
        ] {
            assert!(MentorHandler::template_for(action).contains("{message}"));
        }
        assert_eq!(MentorHandler::template_for("query"), "{message}");
    }
}
