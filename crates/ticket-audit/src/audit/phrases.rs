use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use super::normalizer::compact;
use super::static_regex;

static JUSTIFICATIONS: OnceLock<Vec<String>> = OnceLock::new();
static CONFIRMATION: OnceLock<Regex> = OnceLock::new();
static CLOSURE: OnceLock<Regex> = OnceLock::new();
static ATTACHMENT: OnceLock<Regex> = OnceLock::new();
static FIRST_REMINDER: OnceLock<Regex> = OnceLock::new();
static FIRST_OR_SECOND_REMINDER: OnceLock<Regex> = OnceLock::new();
static FINAL_REMINDER: OnceLock<Regex> = OnceLock::new();

const PASSWORD_SYMBOLS: &[char] = &['@', '$', '!', '%', '*', '?', '&'];
const MIN_PASSWORD_LEN: usize = 8;

// Matched against the comment log with all whitespace removed.
const JUSTIFICATION_PHRASES: &[&str] = &[
    // user or customer
    "confirmation pending",
    "as per confirmation we are closing the ticket",
    "awaiting user confirmation",
    "waiting for user reply",
    "waiting for user input",
    "waiting for user",
    "waiting for user confirmation",
    "waiting user inputs",
    "awaiting user inputs",
    "waiting for user response",
    "pending with user",
    "awaiting user input",
    "awaiting user response",
    "waiting on user",
    "pending user input",
    "pending user response",
    "need user input",
    "need user action",
    "waiting for customer",
    "awaiting customer response",
    "waiting for customer reply",
    "pending with customer",
    "awaiting feedback from user",
    "waiting for end user",
    "awaiting end user response",
    "waiting for user clarification",
    "user to provide details",
    "user action required",
    "user response awaited",
    "user reply pending",
    "waiting for user availability",
    "scheduled user meeting",
    "user not available",
    "user testing",
    "awaiting user testing",
    "waiting for user testing",
    // vendor
    "waiting for vendor",
    "pending with vendor",
    "awaiting vendor response",
    "vendor working on it",
    "escalated to vendor",
    "waiting for third party",
    "awaiting vendor support",
    "vendor approval required",
    "waiting for vendor update",
    "vendor ticket created",
    "awaiting manufacturer response",
    // investigation
    "we are working on it",
    "we are looking into the issue",
    "under investigation",
    "analyzing the issue",
    "troubleshooting in progress",
    "root cause analysis",
    "technical analysis",
    "debugging in progress",
    "performing tests",
    "running diagnostics",
    "checking logs",
    "monitoring the system",
    "awaiting test results",
    "testing in progress",
    "replicating the issue",
    "gathering logs",
    "system analysis",
    // approvals
    "awaiting approval",
    "pending approval",
    "waiting for manager approval",
    "management approval required",
    "awaiting authorization",
    "budget approval required",
    "security approval needed",
    "change approval required",
    "awaiting cab review",
    "cab approval required",
    "escalation required",
    // scheduling
    "scheduled maintenance",
    "waiting for maintenance window",
    "planned outage",
    "scheduled downtime",
    "awaiting maintenance slot",
    "scheduled for implementation",
    "waiting for change window",
    "deployment scheduled",
    "patching scheduled",
    "upgrade window scheduled",
    // expertise
    "awaiting subject matter expert",
    "escalated to specialist team",
    "waiting for expert assignment",
    "assigned to senior team",
    "awaiting sme",
    "l2 escalation",
    "l3 escalation",
    "transferred to specialist team",
    "expert review required",
    "awaiting team lead review",
    // dependencies
    "waiting for dependent ticket",
    "related ticket in progress",
    "coordinating with other teams",
    "dependent on parent ticket",
    "blocked by other issue",
    "awaiting prerequisite fixes",
    "coordination required",
    "multiple agents working",
    "cross team coordination",
    // logistics
    "waiting for delivery",
    "hardware ordered",
    "awaiting shipment",
    "procurement in progress",
    "purchase order submitted",
    "awaiting hardware",
    "waiting for replacement parts",
    "delivery scheduled",
    "equipment in transit",
    // platform
    "system maintenance",
    "environment issue",
    "network issue",
    "server issue",
    "application down",
    "system unavailable",
    "platform issue",
    "infrastructure issue",
    "service degradation",
    "performance issue",
    // communication
    "we will get back to you",
    "updates will be provided",
    "progress update to follow",
    "status update pending",
    "communication in progress",
    "meeting scheduled",
    "discussion required",
    "conference organized",
    // process
    "documentation in progress",
    "procedure being updated",
    "policy review required",
    "compliance check needed",
    "audit in progress",
    "documentation review required",
    "procedural review needed",
    // general
    "ticket escalated",
    "further analysis required",
    "monitoring for further issues",
    "awaiting confirmation",
    "solution being tested",
    "resolution in progress",
    "working on this ticket",
    "issue being investigated",
    "looking into the issue",
    "checking with backend team",
];

const CONFIRMATION_PATTERN: &str = r"(?ix)
    \b(?:
        (?:user|end\s*user|customer|client|requester)\s+
            (?:confirm(?:ed|s|ing)?|acknowledge(?:d|s|ment)?|approve(?:d|s)?|agree(?:d|s)?)
      | confirm(?:ed|s|ing)? | confirmation | approve(?:d|s)? | agreed | acknowledged
      | verified | validated | tested(?:\s+and\s+working)?
      | (?:issue|problem|it|this)\s+(?:is\s+)?(?:fixed|resolved|working|work(?:s|ed)|sorted|clear(?:ed)?)
      | (?:now\s+)?(?:working\s+fine|works\s+fine|working\s+now|works\s+now)
      | (?:looks|seems)\s+(?:good|fine)
      | no\s+issues?\s+(?:now|anymore)
      | (?:all\s+)?(?:good|set|sorted)
      | (?:resolved|fixed)\s+from\s+my\s+side
      | (?:able|can)\s+to\s+(?:login|log\s*in|sign\s*in|access|connect)
      | login\s+(?:successful|works|working)
      | access\s+(?:restored|working)
      | (?:connected|connection)\s+(?:successful|works|working)
      | ok | okay | kk | k | yes | yep | yup | ya | yeah | y
      | sure(?:\s+thing)? | sounds\s+good | please\s+proceed | go\s+ahead | proceed
      | (?:user|end\s*user|customer|client|requester)\s+replied\b
            .*\b(?:confirm|confirmed|acknowledged|all\s+good|working)\b.*\b(?:slack|teams|e-?mail|mail|outlook)
      | (?:confirmed|acknowledged)\b.*\b(?:over|via|on|in|through)\b.*\b(?:slack|teams|e-?mail|mail|outlook)
      | repl(?:y|ied)\b.*\b(?:on|in|via|through)\b.*\b(?:slack|teams|e-?mail|mail|outlook)\b
            .*\b(?:confirm|confirmed|acknowledged|all\s+good|working)
      | (?:e-?mail|mail)\s+from\s+(?:user|end\s*user|customer|client|requester)\b
            .*\b(?:confirm|confirmed|acknowledged|all\s+good|working)
    )\b
    | \x{1F44D} | \x{2705}
";

const CLOSURE_PATTERN: &str = r"(?ix)
    \b(?:
        close | closure | closing
      | (?:proceed|going)\s+to\s+close
      | proceed\b.*to\b.*close
      | good\s+to\s+close | we\s+can\s+close | you\s+can\s+close | please\s+close
      | close\b.*(?:ticket|incident)
      | (?:mark|marking)\s+(?:this|the)?\s*ticket\s+as\s+resolved
      | mark\s*resolved
      | resolved? | resolving\s+the\s+incident
      | (?:issue|ticket|incident)\s+(?:is\s+)?(?:resolved|completed|closed)
      | (?:upon|post)\s+(?:your|user)\s+confirmation\b.*(?:mark|close|resolved)
      | (?:hence|therefore)\b.*(?:closing|resolving)\b.*(?:incident|ticket|issue)
      | thanks\b.*(?:close|closure)
    )\b
";

const FIRST_REMINDER_PATTERN: &str = r"(?i)\bfirst reminder\b|\bgentle reminder\b|\b1st reminder\b|\breminder[\s\-:#]*1\b|\breminder\b.*\b1\b|\breminder\b.*\bfirst\b|\breminder[\s\-]*one\b|\binitial reminder\b|\breminder number one\b|\breminder sent first\b|\breminder sent on\b.*\bfirst\b";

const SECOND_REMINDER_PATTERN: &str = r"\bsecond reminder\b|\b2nd reminder\b|\breminder[\s\-:#]*2\b|\breminder\b.*\b2\b|\breminder\b.*\bsecond\b|\breminder[\s\-]*two\b|\breminder number two\b|\banother reminder\b|\breminder sent second\b|\breminder again\b";

const FINAL_REMINDER_PATTERN: &str = r"(?i)\bfinal reminder\b|\bthird reminder\b|\b3rd reminder\b|\breminder[\s\-:#]*3\b|\breminder\b.*\b3\b|\breminder\b.*\bthird\b|\breminder[\s\-]*three\b|\blast reminder\b|\breminder number three\b|\bultimate reminder\b|\bclosing reminder\b|\breminder before closure\b|\breminder before escalation\b";

fn justifications() -> &'static [String] {
    JUSTIFICATIONS.get_or_init(|| JUSTIFICATION_PHRASES.iter().map(|p| compact(p)).collect())
}

/// True when the comment log states why the ticket is on hold.
pub fn has_pending_justification(text: &str) -> bool {
    let haystack = compact(text);
    justifications()
        .iter()
        .any(|phrase| haystack.contains(phrase.as_str()))
}

/// Whitespace-delimited token shaped like a strong password.
pub fn looks_like_password(token: &str) -> bool {
    token.chars().count() >= MIN_PASSWORD_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(&c))
        && token.chars().any(|c| c.is_ascii_lowercase())
        && token.chars().any(|c| c.is_ascii_uppercase())
        && token.chars().any(|c| c.is_ascii_digit())
        && token.chars().any(|c| PASSWORD_SYMBOLS.contains(&c))
}

pub fn contains_password(text: &str) -> bool {
    text.split_whitespace().any(looks_like_password)
}

/// Both a user confirmation and a closure intent appear somewhere in the text.
pub fn confirms_closure(text: &str) -> bool {
    let lowered = text.to_lowercase();
    static_regex(&CONFIRMATION, CONFIRMATION_PATTERN).is_match(&lowered)
        && static_regex(&CLOSURE, CLOSURE_PATTERN).is_match(&lowered)
}

pub fn mentions_attachment(text: &str) -> bool {
    static_regex(&ATTACHMENT, r"(?i)\b(?:attachments?|attached)\b").is_match(text)
}

/// Reminder expected for a ticket of a given age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderStage {
    First,
    FirstOrSecond,
    Final,
}

impl ReminderStage {
    /// Stage for tickets at least three days old: up to five days, up to seven, beyond.
    pub fn for_age(age_days: f64) -> Self {
        if age_days <= 5.0 {
            ReminderStage::First
        } else if age_days <= 7.0 {
            ReminderStage::FirstOrSecond
        } else {
            ReminderStage::Final
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReminderStage::First => "1st reminder",
            ReminderStage::FirstOrSecond => "1st/2nd reminder",
            ReminderStage::Final => "final reminder",
        }
    }

    pub fn found_in(self, text: &str) -> bool {
        let pattern = match self {
            ReminderStage::First => static_regex(&FIRST_REMINDER, FIRST_REMINDER_PATTERN),
            // The leading (?i) of the first-reminder pattern spans the appended alternatives.
            ReminderStage::FirstOrSecond => FIRST_OR_SECOND_REMINDER.get_or_init(|| {
                Regex::new(&format!("{FIRST_REMINDER_PATTERN}|{SECOND_REMINDER_PATTERN}"))
                    .expect("built-in pattern compiles")
            }),
            ReminderStage::Final => static_regex(&FINAL_REMINDER, FINAL_REMINDER_PATTERN),
        };
        pattern.is_match(text)
    }
}

/// Lowercase alphanumeric word set used for keyword-subset matching.
pub fn tokenize(text: &str) -> BTreeSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn justification_ignores_spacing_and_case() {
        assert!(has_pending_justification("Still Waiting for\nUser   Reply on the VPN issue"));
        assert!(has_pending_justification("coordinating with other teams"));
        assert!(!has_pending_justification("Restarted the service."));
    }

    #[test]
    fn password_tokens_need_every_character_class() {
        assert!(contains_password("temp creds Welcome@2025 shared"));
        assert!(!contains_password("welcome@2025 is lowercase"));
        assert!(!contains_password("Sh@1abc"));
        assert!(!contains_password("Welcome#2025 uses a symbol outside the set"));
        assert!(looks_like_password("Short@1ab"));
    }

    #[test]
    fn closure_needs_confirmation_and_intent() {
        assert!(confirms_closure(
            "User confirmed the issue is fixed. Closing the ticket."
        ));
        assert!(!confirms_closure("Closing the ticket due to inactivity"));
        assert!(!confirms_closure("Replied to the thread"));
    }

    #[test]
    fn reminder_stages_follow_age_bands() {
        assert_eq!(ReminderStage::for_age(3.0), ReminderStage::First);
        assert_eq!(ReminderStage::for_age(6.5), ReminderStage::FirstOrSecond);
        assert_eq!(ReminderStage::for_age(7.1), ReminderStage::Final);

        assert!(ReminderStage::First.found_in("Sent a Gentle Reminder to the user"));
        assert!(ReminderStage::FirstOrSecond.found_in("second reminder sent"));
        assert!(!ReminderStage::Final.found_in("first reminder sent"));
        assert!(ReminderStage::Final.found_in("Final reminder before closure"));
    }

    #[test]
    fn tokenizer_splits_on_non_alphanumerics() {
        let tokens = tokenize("VPN-client: can't connect (error 809)");
        let expected: BTreeSet<String> = ["vpn", "client", "can", "t", "connect", "error", "809"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn attachment_mentions_are_word_bounded() {
        assert!(mentions_attachment("Screenshot attached."));
        assert!(!mentions_attachment("unattached"));
    }
}
