//! The twelve signal evaluators.
//!
//! Each evaluator looks at one aspect of a candidate element and either
//! stays silent or returns a [`SignalEvaluation`] with the type it suggests.
//! Evaluators that are too noisy to be useful when they miss (input type,
//! css/data attributes, heading and section context, board selector) only
//! report matches.

use lazy_static::lazy_static;
use regex::Regex;

use crate::dom::{Dom, NodeId};
use crate::pipeline::normalize::{collapse_whitespace, truncate_chars};
use crate::registry::SelectorRegistry;
use crate::types::{FieldType, SignalEvaluation, SignalKind};

const MAX_SIBLING_TEXT_LEN: usize = 100;
const MAX_RAW_CSS_LEN: usize = 100;

lazy_static! {
    // First match wins, so more specific patterns come first.
    static ref FIELD_PATTERNS: Vec<(FieldType, Regex)> = {
        use FieldType::*;
        [
            (FirstName, r"first.?name|given.?name|fname|first_name|vorname"),
            (LastName, r"last.?name|family.?name|lname|surname|last_name|nachname"),
            (FullName, r"full.?name|your.?name|^name$|applicant.?name|candidate.?name"),
            (Email, r"e.?mail|email.?address|email_address"),
            (Phone, r"phone|tel(?:ephone)?|mobile|cell|contact.?number"),
            (Location, r"^location$|current.?location|your.?location"),
            (Address, r"address|street|mailing"),
            (City, r"^city$|^town$"),
            (State, r"^state$|^province$|^region$"),
            (ZipCode, r"zip|postal|postcode|zip.?code"),
            (Country, r"^country$|country.?of.?residence"),
            (LinkedinUrl, r"linkedin|linked.?in"),
            (PortfolioUrl, r"portfolio|personal.?site|github|website.?url|portfolio.?url"),
            (WebsiteUrl, r"website|homepage|blog|url"),
            (ResumeUpload, r"resume|cv|curriculum"),
            (CoverLetterUpload, r"cover.?letter.?upload|cover.?letter.?file"),
            (CoverLetterText, r"cover.?letter|covering.?letter"),
            (YearsExperience, r"years?.?(?:of)?.?experience|experience.?years"),
            (Education, r"education|degree|school|university|qualification"),
            (Salary, r"salary|compensation|pay|wage|desired.?pay"),
            (StartDate, r"start.?date|available|earliest.?start|begin"),
            (CurrentCompany, r"current.?company|current.?employer|present.?company"),
            (CurrentTitle, r"current.?title|current.?position|job.?title|current.?role"),
            (WorkAuthorization, r"work.?auth|authorized|legally.?authorized|right.?to.?work|eligible.?to.?work"),
            (SponsorshipRequired, r"sponsor|visa.?sponsor|immigration.?sponsor"),
            (EeoGender, r"gender|sex(?:$|\s)"),
            (EeoRaceEthnicity, r"race|ethnicity|ethnic"),
            (EeoVeteranStatus, r"veteran|military|armed.?forces"),
            (EeoDisabilityStatus, r"disability|disabled|handicap"),
        ]
        .into_iter()
        .map(|(field_type, pattern)| (field_type, Regex::new(&format!("(?i){pattern}")).unwrap()))
        .collect()
    };
}

/// Field type suggested by free text, if any pattern matches.
pub fn match_pattern(value: &str) -> Option<FieldType> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    FIELD_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(trimmed))
        .map(|(field_type, _)| *field_type)
}

fn autocomplete_type(token: &str) -> Option<FieldType> {
    use FieldType::*;
    let field_type = match token {
        "given-name" => FirstName,
        "family-name" => LastName,
        "name" => FullName,
        "email" => Email,
        "tel" | "tel-national" => Phone,
        "street-address" | "address-line1" => Address,
        "address-level2" => City,
        "address-level1" => State,
        "postal-code" => ZipCode,
        "country" | "country-name" => Country,
        "url" => WebsiteUrl,
        "organization" => CurrentCompany,
        "organization-title" => CurrentTitle,
        "sex" => EeoGender,
        _ => return None,
    };
    Some(field_type)
}

fn input_type_type(kind: &str) -> Option<FieldType> {
    match kind {
        "email" => Some(FieldType::Email),
        "tel" => Some(FieldType::Phone),
        "url" => Some(FieldType::WebsiteUrl),
        "file" => Some(FieldType::ResumeUpload),
        _ => None,
    }
}

/// Everything the evaluators need besides the element itself.
pub struct SignalContext<'a> {
    pub dom: &'a Dom,
    pub registry: &'a SelectorRegistry,
    pub board: Option<&'a str>,
    /// Stable id attribute, ignored by the css/data evaluator
    pub id_attribute: &'a str,
}

/// Signals of one element plus the registry entry that matched it, if any.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalSet {
    pub evaluations: Vec<SignalEvaluation>,
    pub registry_entry_id: Option<String>,
}

/// Run every evaluator against `el`, in declaration order.
pub fn evaluate_all(ctx: &SignalContext<'_>, el: NodeId) -> SignalSet {
    let dom = ctx.dom;
    let mut evaluations: Vec<SignalEvaluation> = [
        autocomplete(dom, el),
        name_id(dom, el),
        input_type(dom, el),
        label_for(dom, el),
        aria_label(dom, el),
        placeholder(dom, el),
        parent_label(dom, el),
        sibling_text(dom, el),
        css_data_attr(dom, el, ctx.id_attribute),
        heading_context(dom, el),
        section_context(dom, el),
    ]
    .into_iter()
    .flatten()
    .collect();

    let board = board_selector(ctx, el);
    let registry_entry_id = board.as_ref().map(|(_, id)| id.clone());
    evaluations.extend(board.map(|(evaluation, _)| evaluation));

    SignalSet {
        evaluations,
        registry_entry_id,
    }
}

fn text_of(dom: &Dom, id: NodeId) -> String {
    collapse_whitespace(&dom.text_content(id))
}

/// Shared shape of the text-pattern evaluators that also report misses.
fn text_signal(signal: SignalKind, text: String, what: &str) -> SignalEvaluation {
    match match_pattern(&text) {
        Some(field_type) => {
            let reason = format!("{what} \"{text}\" matches {field_type}");
            SignalEvaluation::matched(signal, text, field_type, reason)
        }
        None => {
            let reason = format!("{what} \"{text}\" has no known pattern");
            SignalEvaluation::unmatched(signal, text, FieldType::CustomQuestion, reason)
        }
    }
}

fn autocomplete(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let value = dom.attr(el, "autocomplete")?;
    let token = value.trim().to_ascii_lowercase();
    if token.is_empty() || token == "off" || token == "on" {
        return None;
    }
    Some(match autocomplete_type(&token) {
        Some(field_type) => SignalEvaluation::matched(
            SignalKind::Autocomplete,
            value,
            field_type,
            format!("autocomplete=\"{value}\" maps to {field_type}"),
        ),
        None => SignalEvaluation::unmatched(
            SignalKind::Autocomplete,
            value,
            FieldType::Unknown,
            format!("autocomplete=\"{value}\" has no known mapping"),
        ),
    })
}

fn name_id(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let combined = dom
        .attr(el, "name")
        .filter(|n| !n.is_empty())
        .or_else(|| dom.attr(el, "id"))
        .filter(|v| !v.is_empty())?;
    Some(match match_pattern(combined) {
        Some(field_type) => SignalEvaluation::matched(
            SignalKind::NameIdRegex,
            combined,
            field_type,
            format!("name/id \"{combined}\" matches {field_type} pattern"),
        ),
        None => SignalEvaluation::unmatched(
            SignalKind::NameIdRegex,
            combined,
            FieldType::Unknown,
            format!("name/id \"{combined}\" has no known pattern match"),
        ),
    })
}

fn input_type(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let kind = dom.attr(el, "type")?.trim().to_ascii_lowercase();
    let field_type = input_type_type(&kind)?;
    let reason = format!("input type=\"{kind}\" maps to {field_type}");
    Some(SignalEvaluation::matched(SignalKind::InputType, kind, field_type, reason))
}

fn label_for(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let label = associated_label(dom, el)?;
    let text = text_of(dom, label);
    if text.is_empty() {
        return None;
    }
    Some(text_signal(SignalKind::LabelFor, text, "<label> text"))
}

/// `<label for=...>` pointing at `el`, searched in `el`'s tree scope.
pub(crate) fn associated_label(dom: &Dom, el: NodeId) -> Option<NodeId> {
    let id = dom.attr(el, "id").filter(|id| !id.is_empty())?;
    dom.find_descendant(dom.tree_root(el), |candidate| {
        candidate.tag() == "label" && candidate.attr("for") == Some(id)
    })
}

fn aria_label(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let value = dom.attr(el, "aria-label")?.trim();
    if value.is_empty() {
        return None;
    }
    Some(text_signal(SignalKind::AriaLabel, value.to_string(), "aria-label"))
}

fn placeholder(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let value = dom.attr(el, "placeholder")?.trim();
    if value.is_empty() {
        return None;
    }
    Some(text_signal(SignalKind::Placeholder, value.to_string(), "placeholder"))
}

fn parent_label(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let label = dom.closest(el, &["label"])?;
    let text = text_of(dom, label);
    if text.is_empty() {
        return None;
    }
    Some(text_signal(SignalKind::ParentLabel, text, "parent <label>"))
}

fn sibling_text(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let prev = dom.previous_element_sibling(el)?;
    if !matches!(dom.tag(prev), Some("label" | "span" | "div" | "p")) {
        return None;
    }
    let text = text_of(dom, prev);
    if text.is_empty() || text.chars().count() > MAX_SIBLING_TEXT_LEN {
        return None;
    }
    Some(text_signal(SignalKind::SiblingText, text, "sibling text"))
}

fn css_data_attr(dom: &Dom, el: NodeId, id_attribute: &str) -> Option<SignalEvaluation> {
    let element = dom.element(el)?;
    let class = element.attr("class").unwrap_or_default();
    let data: Vec<String> = element
        .attrs()
        .filter(|(name, _)| name.starts_with("data-") && !name.eq_ignore_ascii_case(id_attribute))
        .map(|(name, value)| format!("{name}={value}"))
        .collect();
    let combined = format!("{class} {}", data.join(" ")).trim().to_string();
    if combined.is_empty() {
        return None;
    }
    let field_type = match_pattern(&combined)?;
    Some(SignalEvaluation::matched(
        SignalKind::CssDataAttr,
        truncate_chars(&combined, MAX_RAW_CSS_LEN),
        field_type,
        format!("CSS/data attrs contain {field_type} pattern"),
    ))
}

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// First heading inside the nearest ancestor that has one.
pub(crate) fn nearest_heading(dom: &Dom, el: NodeId) -> Option<NodeId> {
    let mut parent = dom.parent_element(el);
    while let Some(ancestor) = parent {
        if let Some(heading) = dom.find_descendant(ancestor, |e| HEADING_TAGS.contains(&e.tag())) {
            return Some(heading);
        }
        parent = dom.parent_element(ancestor);
    }
    None
}

fn heading_context(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let heading = nearest_heading(dom, el)?;
    let text = text_of(dom, heading);
    let field_type = match_pattern(&text)?;
    let reason = format!("heading \"{text}\" suggests {field_type}");
    Some(SignalEvaluation::matched(SignalKind::HeadingContext, text, field_type, reason))
}

fn section_context(dom: &Dom, el: NodeId) -> Option<SignalEvaluation> {
    let section = dom.closest_by(el, |e| {
        matches!(e.tag(), "fieldset" | "section") || e.attr("role") == Some("group")
    })?;
    let legend = dom.find_descendant(section, |e| e.tag() == "legend" || e.attr("role") == Some("heading"))?;
    let text = text_of(dom, legend);
    let field_type = match_pattern(&text)?;
    let reason = format!("section context \"{text}\" suggests {field_type}");
    Some(SignalEvaluation::matched(SignalKind::SectionContext, text, field_type, reason))
}

fn board_selector(ctx: &SignalContext<'_>, el: NodeId) -> Option<(SignalEvaluation, String)> {
    let board = ctx.board?;
    for entry in ctx.registry.write_entries(board) {
        for selector in &entry.selectors {
            // unparsable selectors never match
            if ctx.dom.matches(el, selector).unwrap_or(false) {
                let field_type = entry.fill_type();
                let evaluation = SignalEvaluation::matched(
                    SignalKind::BoardSelector,
                    format!("{}:{}:{}", entry.board, entry.field, selector),
                    field_type,
                    format!("matches board selector {}: {}", entry.id, selector),
                );
                return Some((evaluation, entry.id.clone()));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(markup: &str, selector: &str, board: Option<&str>) -> SignalSet {
        let dom = Dom::parse(markup, "");
        let registry = SelectorRegistry::builtin();
        let el = dom.query_selector_deep(selector).unwrap().unwrap();
        let ctx = SignalContext {
            dom: &dom,
            registry: &registry,
            board,
            id_attribute: "data-jf-opid",
        };
        evaluate_all(&ctx, el)
    }

    fn kinds(set: &SignalSet) -> Vec<(SignalKind, FieldType, bool)> {
        set.evaluations
            .iter()
            .map(|e| (e.signal, e.suggested_type, e.matched))
            .collect()
    }

    #[test]
    fn test_pattern_order() {
        assert_eq!(match_pattern("First Name"), Some(FieldType::FirstName));
        assert_eq!(match_pattern("name"), Some(FieldType::FullName));
        assert_eq!(match_pattern("Email address"), Some(FieldType::Email));
        assert_eq!(match_pattern("LinkedIn profile URL"), Some(FieldType::LinkedinUrl));
        assert_eq!(match_pattern("Why do you want this job?"), None);
        assert_eq!(match_pattern("   "), None);
    }

    #[test]
    fn test_autocomplete_and_input_type() {
        let set = eval(r#"<input type="email" autocomplete="email" name="contact">"#, "input", None);
        assert_eq!(
            kinds(&set),
            vec![
                (SignalKind::Autocomplete, FieldType::Email, true),
                (SignalKind::NameIdRegex, FieldType::Unknown, false),
                (SignalKind::InputType, FieldType::Email, true),
            ]
        );
    }

    #[test]
    fn test_autocomplete_off_is_silent() {
        let set = eval(r#"<input autocomplete="off">"#, "input", None);
        assert!(set.evaluations.is_empty());
    }

    #[test]
    fn test_label_signals() {
        let set = eval(
            r#"<form><section><legend>Contact details</legend>
                <label for="p">Phone number</label>
                <label>Your mobile <input id="p" placeholder="+1 555"></label>
            </section></form>"#,
            "#p",
            None,
        );
        let found = kinds(&set);
        assert!(found.contains(&(SignalKind::LabelFor, FieldType::Phone, true)));
        assert!(found.contains(&(SignalKind::ParentLabel, FieldType::Phone, true)));
        assert!(found.contains(&(SignalKind::Placeholder, FieldType::CustomQuestion, false)));
        // "Contact details" does not match any pattern
        assert!(!found.iter().any(|(k, _, _)| *k == SignalKind::SectionContext));
    }

    #[test]
    fn test_sibling_heading_and_css_signals() {
        let set = eval(
            r#"<div><h3>Education</h3><div><span>School</span><input class="field-university" data-jf-opid="jf-field-0"></div></div>"#,
            "input",
            None,
        );
        let found = kinds(&set);
        assert!(found.contains(&(SignalKind::SiblingText, FieldType::Education, true)));
        assert!(found.contains(&(SignalKind::CssDataAttr, FieldType::Education, true)));
        assert!(found.contains(&(SignalKind::HeadingContext, FieldType::Education, true)));
        let css = set
            .evaluations
            .iter()
            .find(|e| e.signal == SignalKind::CssDataAttr)
            .unwrap();
        assert_eq!(css.raw_value, "field-university");
    }

    #[test]
    fn test_board_write_selector_signal() {
        let set = eval(r#"<form><input id="first_name" name="job_application[first_name]"><input id="job_application_location"></form>"#, "#job_application_location", Some("greenhouse"));
        assert_eq!(set.registry_entry_id.as_deref(), Some("greenhouse-location-input"));
        let board = set.evaluations.last().unwrap();
        assert_eq!(board.signal, SignalKind::BoardSelector);
        assert_eq!(board.suggested_type, FieldType::Location);
    }
}
