use super::comments::comment_dates;
use super::{Rule, RuleContext, RuleId};
use crate::audit::calendar::{check_cadence, CadencePattern};
use crate::audit::config::Thresholds;
use crate::audit::outcome::Outcome;
use crate::audit::ticket::TicketRecord;

/// Three-strike follow-up cadence over the update days found in the comment log.
pub(super) struct CadenceRule {
    pub id: RuleId,
    pub pattern: CadencePattern,
    pub age_threshold: fn(&Thresholds) -> f64,
}

impl Rule for CadenceRule {
    fn id(&self) -> RuleId {
        self.id
    }

    fn evaluate(&self, ticket: &TicketRecord, ctx: &RuleContext<'_>) -> Outcome {
        // Tickets without a known age are still checked.
        if ticket
            .age()
            .is_some_and(|age| age <= (self.age_threshold)(ctx.thresholds))
        {
            return Outcome::label("Age <= Threshold");
        }
        Outcome::label(check_cadence(&self.pattern, &comment_dates(ticket)).label())
    }
}
