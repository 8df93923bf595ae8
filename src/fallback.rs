//! Offline answers for when every upstream path is exhausted.
//!
//! A handful of keyword buckets over the last user utterance, each mapped
//! to a canned marketplace answer. No network, no state: when credentials
//! are exhausted the widget still gets something useful to show.

use crate::models::ChatMessage;

const GREETING_KEYWORDS: [&str; 7] = [
    "hello",
    "hi",
    "hey",
    "namaste",
    "good morning",
    "good afternoon",
    "good evening",
];

const PRICING_KEYWORDS: [&str; 11] = [
    "price", "prices", "pricing", "cost", "costs", "budget", "emi", "loan", "mortgage", "payment",
    "afford",
];

const LOCATION_KEYWORDS: [&str; 10] = [
    "location",
    "area",
    "neighborhood",
    "neighbourhood",
    "locality",
    "nearby",
    "school",
    "schools",
    "commute",
    "where",
];

const GREETING_REPLY: &str = "Hello! I'm the Nestline assistant. I can help you browse listings, \
compare neighborhoods, or estimate monthly payments. What are you looking for?";

const PRICING_REPLY: &str = "Pricing details live on each listing page: the asking price, the \
price history for the area, and an EMI calculator for monthly estimates. If you have a budget \
range in mind, the search filters can narrow things down from there.";

const LOCATION_REPLY: &str = "Every listing page has a location section with the neighborhood, \
nearby schools, and commute estimates. You can also filter search results by area from the main \
search bar.";

const GENERIC_REPLY: &str = "I'm having trouble reaching our assistant service right now. You \
can keep browsing listings and saved searches as usual, and I'll be back shortly.";

/// Produce a canned answer for the last user utterance. Pure function:
/// same conversation in, same text out.
pub fn respond(conversation: &[ChatMessage]) -> String {
    let utterance = conversation
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.to_lowercase())
        .unwrap_or_default();

    let reply = if matches_bucket(&utterance, &GREETING_KEYWORDS) {
        GREETING_REPLY
    } else if matches_bucket(&utterance, &PRICING_KEYWORDS) {
        PRICING_REPLY
    } else if matches_bucket(&utterance, &LOCATION_KEYWORDS) {
        LOCATION_REPLY
    } else {
        GENERIC_REPLY
    };
    reply.to_string()
}

/// Single-word keywords match whole words; multi-word keywords match as
/// substrings. Keeps "hi" from firing inside "this".
fn matches_bucket(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.contains(' ') {
            text.contains(keyword)
        } else {
            text.split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *keyword)
        }
    })
}
