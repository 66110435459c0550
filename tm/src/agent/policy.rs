//! Dispatcher policy checks
//!
//! These run on every trip-changing tool call no matter which classifier
//! produced it: vague dates are clarified, non-USD budgets are converted
//! only with the user's agreement and very long trips need a yes.

use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use super::AgentError;
use crate::config::PolicyConfig;
use crate::dates;
use crate::llm::ToolCall;
use crate::tools::{opt_i64, opt_str};

const VAGUE_DATE_PHRASES: &[&str] = &[
    "next summer",
    "this summer",
    "next winter",
    "christmas",
    "spring break",
    "sometime",
    "some time",
    "the holidays",
    "over the holidays",
];

const AFFIRMATIVE: &[&str] = &[
    "yes",
    "y",
    "yeah",
    "yep",
    "sure",
    "ok",
    "okay",
    "confirm",
    "please do",
    "go ahead",
    "sounds good",
    "correct",
    "do it",
];

/// Currency markers and the ISO code they stand for
///
/// Longer markers come first so `US$` wins over `S$`.
const CURRENCY_MARKERS: &[(&str, &str)] = &[
    ("us$", "USD"),
    ("usd", "USD"),
    ("ca$", "CAD"),
    ("nz$", "NZD"),
    ("hk$", "HKD"),
    ("s$", "SGD"),
    ("a$", "AUD"),
    ("c$", "CAD"),
    ("r$", "BRL"),
    ("€", "EUR"),
    ("£", "GBP"),
    ("¥", "JPY"),
    ("₹", "INR"),
    ("₩", "KRW"),
    ("฿", "THB"),
    ("sgd", "SGD"),
    ("aud", "AUD"),
    ("cad", "CAD"),
    ("nzd", "NZD"),
    ("hkd", "HKD"),
    ("brl", "BRL"),
    ("eur", "EUR"),
    ("euros", "EUR"),
    ("euro", "EUR"),
    ("gbp", "GBP"),
    ("pounds", "GBP"),
    ("pound", "GBP"),
    ("jpy", "JPY"),
    ("yen", "JPY"),
    ("chf", "CHF"),
    ("francs", "CHF"),
    ("franc", "CHF"),
    ("inr", "INR"),
    ("rupees", "INR"),
    ("rupee", "INR"),
    ("cny", "CNY"),
    ("rmb", "CNY"),
    ("yuan", "CNY"),
    ("mxn", "MXN"),
    ("pesos", "MXN"),
    ("peso", "MXN"),
    ("krw", "KRW"),
    ("thb", "THB"),
    ("baht", "THB"),
    ("sek", "SEK"),
    ("nok", "NOK"),
    ("dkk", "DKK"),
    ("zar", "ZAR"),
];

/// An amount: `2,000`, `2000` or `2000.50`; never runs across ", "
const AMOUNT: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?";

const NEGATIVE: &[&str] = &["no", "n", "nope", "cancel", "don't", "dont", "never mind", "nevermind", "stop"];

/// Outcome of reviewing the calls for one message
#[derive(Debug, Clone, PartialEq)]
pub enum Review {
    /// Nothing to ask; run the calls as they are
    Proceed,
    /// Ask a question and run nothing
    Clarify(String),
    /// Run `calls` (possibly adjusted) only after the user agrees
    Confirm { prompt: String, calls: Vec<ToolCall> },
}

/// A currency amount found in a message
#[derive(Debug, Clone, PartialEq)]
struct ForeignAmount {
    code: String,
    amount: f64,
}

pub struct PolicyGuard {
    long_trip_days: i64,
    rates: BTreeMap<String, f64>,
    /// Marker before the amount: `S$2,000`, `SGD 2000`
    currency_first: Regex,
    /// Amount before the marker: `2000 SGD`, `1500 euros`
    amount_first: Regex,
}

impl PolicyGuard {
    pub fn new(config: &PolicyConfig) -> Result<Self, AgentError> {
        debug!(long_trip_days = config.long_trip_confirm_days, "PolicyGuard::new: called");
        Ok(Self {
            long_trip_days: config.long_trip_confirm_days,
            rates: config
                .currency_rates
                .iter()
                .map(|(code, rate)| (code.to_uppercase(), *rate))
                .collect(),
            currency_first: Regex::new(&format!(
                r"(?i)(?P<cur>{})\s*(?P<amount>{})\s*(?P<k>k\b)?",
                marker_pattern(true),
                AMOUNT
            ))?,
            amount_first: Regex::new(&format!(
                r"(?i)(?P<amount>{})\s*(?P<k>k\b)?\s*(?P<cur>{})",
                AMOUNT,
                marker_pattern(false)
            ))?,
        })
    }

    /// Review the tool calls produced for `message`
    ///
    /// Only `plan_trip` and `update_trip` are checked.
    pub fn review(&self, message: &str, calls: &[ToolCall]) -> Review {
        debug!(call_count = calls.len(), "PolicyGuard::review: called");
        let mut prompts = Vec::new();
        let mut adjusted = Vec::with_capacity(calls.len());

        for call in calls {
            if !matches!(call.name.as_str(), "plan_trip" | "update_trip") {
                adjusted.push(call.clone());
                continue;
            }
            if (call.name == "plan_trip" || touches_dates(&call.input))
                && let Some(question) = self.vague_dates(message, &call.input)
            {
                debug!("PolicyGuard::review: vague dates");
                return Review::Clarify(question);
            }

            let mut call = call.clone();
            let foreign = call
                .input
                .get("budget")
                .is_some_and(|b| !b.is_null())
                .then(|| self.foreign_amount(message))
                .flatten();
            if let Some(foreign) = foreign {
                let Some(rate) = self.rates.get(&foreign.code) else {
                    debug!(code = %foreign.code, "PolicyGuard::review: no rate for currency");
                    return Review::Clarify(format!(
                        "You mentioned {} {}. Budgets are kept in USD and I don't have a rate for {}. What is that amount in US dollars?",
                        format_amount(foreign.amount),
                        foreign.code,
                        foreign.code
                    ));
                };
                let usd = (foreign.amount * rate).round();
                debug!(code = %foreign.code, amount = foreign.amount, usd, "PolicyGuard::review: foreign currency");
                prompts.push(format!(
                    "You mentioned {} {}. Budgets are kept in USD, and that's about ${:.0} (1 {} = {} USD). Shall I use ${:.0}?",
                    format_amount(foreign.amount),
                    foreign.code,
                    usd,
                    foreign.code,
                    rate,
                    usd
                ));
                if let Value::Object(map) = &mut call.input {
                    map.insert("budget".to_string(), json!(usd));
                }
            }
            if let Some(days) = self.trip_length(&call.input)
                && days > self.long_trip_days
            {
                debug!(days, "PolicyGuard::review: long trip");
                prompts.push(format!(
                    "That's a {}-day trip, longer than {} days. Do you want me to go ahead with it?",
                    days, self.long_trip_days
                ));
            }
            adjusted.push(call);
        }

        if prompts.is_empty() {
            Review::Proceed
        } else {
            Review::Confirm {
                prompt: prompts.join(" "),
                calls: adjusted,
            }
        }
    }

    fn vague_dates(&self, message: &str, input: &Value) -> Option<String> {
        let lower = message.to_lowercase();
        let start = opt_str(input, "start_date").ok().flatten();
        let phrase = VAGUE_DATE_PHRASES.iter().find(|p| lower.contains(*p));
        let has_usable_start = start.as_deref().is_some_and(|s| dates::month_year(s).is_some());

        if let Some(start) = start.as_deref()
            && !has_usable_start
        {
            return Some(format!(
                "I couldn't pin down \"{}\" as a date. Which dates, or at least which month and year, did you have in mind?",
                start
            ));
        }
        match phrase {
            Some(p) if !has_usable_start => Some(format!(
                "When you say \"{}\", which dates, or at least which month and year, do you mean?",
                p
            )),
            _ => None,
        }
    }

    /// First non-USD amount in `message`
    ///
    /// Marker-first phrasings are tried before amount-first ones so a year
    /// ahead of a code ("July 2027 EUR 1500") is not read as the amount.
    fn foreign_amount(&self, message: &str) -> Option<ForeignAmount> {
        [&self.currency_first, &self.amount_first]
            .into_iter()
            .flat_map(|re| re.captures_iter(message))
            .filter_map(|caps| {
                let code = currency_code(caps.name("cur")?.as_str())?;
                let mut amount: f64 = caps.name("amount")?.as_str().replace(',', "").parse().ok()?;
                if caps.name("k").is_some() {
                    amount *= 1000.0;
                }
                Some(ForeignAmount {
                    code: code.to_string(),
                    amount,
                })
            })
            .find(|found| found.code != "USD")
    }

    /// Trip length from duration, else from the inclusive date span
    fn trip_length(&self, input: &Value) -> Option<i64> {
        if let Ok(Some(days)) = opt_i64(input, "duration_days") {
            return Some(days);
        }
        let start = opt_str(input, "start_date").ok().flatten()?;
        let end = opt_str(input, "end_date").ok().flatten()?;
        dates::span_days(&start, &end).map(|d| d + 1)
    }

    /// Whether a reply agrees to a pending request
    pub fn is_affirmative(&self, message: &str) -> bool {
        let reply = normalize_reply(message);
        !self.is_negative(message) && AFFIRMATIVE.iter().any(|a| starts_with_phrase(&reply, a))
    }

    /// Whether a reply turns down a pending request
    pub fn is_negative(&self, message: &str) -> bool {
        let reply = normalize_reply(message);
        NEGATIVE.iter().any(|n| starts_with_phrase(&reply, n))
    }
}

fn currency_code(marker: &str) -> Option<&'static str> {
    let marker = marker.to_lowercase();
    CURRENCY_MARKERS.iter().find(|(m, _)| *m == marker).map(|(_, code)| *code)
}

/// Alternation over every marker
///
/// Word markers get a word boundary on the side away from the amount, so
/// `SGD2000` and `2000SGD` match but `nokia` does not.
fn marker_pattern(before_amount: bool) -> String {
    CURRENCY_MARKERS
        .iter()
        .map(|(marker, _)| match marker.chars().all(|c| c.is_ascii_alphabetic()) {
            true if before_amount => format!(r"\b{}", marker),
            true => format!(r"{}\b", marker),
            false => regex::escape(marker),
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Whether a call sets any date-related field
fn touches_dates(input: &Value) -> bool {
    ["start_date", "end_date", "duration_days"]
        .iter()
        .any(|field| input.get(field).is_some_and(|v| !v.is_null()))
}

fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{:.2}", amount)
    }
}

fn normalize_reply(message: &str) -> String {
    message
        .trim()
        .trim_end_matches(['.', '!', '?'])
        .to_lowercase()
        .replace('’', "'")
}

fn starts_with_phrase(reply: &str, phrase: &str) -> bool {
    reply == phrase
        || reply
            .strip_prefix(phrase)
            .is_some_and(|rest| rest.starts_with(|c: char| !c.is_alphanumeric() && c != '\''))
}
