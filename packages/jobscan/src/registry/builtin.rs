//! Shipped selector table.

use chrono::NaiveDate;

use super::{EntryStatus, SelectorEntry, SelectorMode, SelectorTier, GENERIC_BOARD};
use crate::types::JobField;
use crate::types::JobField::*;

struct Rule {
    id: &'static str,
    board: &'static str,
    field: JobField,
    selectors: &'static [&'static str],
    priority: i32,
    tier: SelectorTier,
    mode: SelectorMode,
    notes: Option<&'static str>,
}

const fn board(
    id: &'static str,
    board: &'static str,
    field: JobField,
    priority: i32,
    selectors: &'static [&'static str],
) -> Rule {
    Rule {
        id,
        board,
        field,
        selectors,
        priority,
        tier: SelectorTier::Board,
        mode: SelectorMode::Read,
        notes: None,
    }
}

const fn fallback(
    id: &'static str,
    tier: SelectorTier,
    field: JobField,
    priority: i32,
    selectors: &'static [&'static str],
) -> Rule {
    Rule {
        id,
        board: GENERIC_BOARD,
        field,
        selectors,
        priority,
        tier,
        mode: SelectorMode::Read,
        notes: None,
    }
}

impl Rule {
    const fn notes(mut self, notes: &'static str) -> Self {
        self.notes = Some(notes);
        self
    }

    const fn write(mut self) -> Self {
        self.mode = SelectorMode::Write;
        self
    }
}

const RULES: &[Rule] = &[
    // LinkedIn
    board("li-title-unified", "linkedin", Title, 1, &[
        ".job-details-jobs-unified-top-card__job-title h1",
        ".job-details-jobs-unified-top-card__job-title a",
        ".job-details-jobs-unified-top-card__job-title",
        ".jobs-unified-top-card__job-title a",
        ".jobs-unified-top-card__job-title",
        ".t-24.job-details-jobs-unified-top-card__job-title",
    ])
    .notes("unified top card, several generations of class names"),
    board("li-title-detail", "linkedin", Title, 2, &[
        ".jobs-details__main-content h1",
        ".jobs-details-top-card__job-title",
        ".job-view-layout h1",
        ".jobs-search__job-details h1",
        ".jobs-details h1",
    ])
    .notes("older detail and search layouts"),
    board("li-company-unified", "linkedin", Company, 1, &[
        ".job-details-jobs-unified-top-card__company-name a",
        ".job-details-jobs-unified-top-card__company-name",
        ".jobs-unified-top-card__company-name a",
        ".jobs-unified-top-card__company-name",
        ".jobs-details-top-card__company-info a",
        ".jobs-details-top-card__company-info",
    ]),
    board("li-description", "linkedin", Description, 1, &[
        ".jobs-description__content",
        ".jobs-box__html-content",
        "#job-details",
        ".show-more-less-html__markup",
    ]),
    board("li-location", "linkedin", Location, 1, &[
        ".job-details-jobs-unified-top-card__bullet",
        ".jobs-unified-top-card__bullet",
    ]),
    board("li-salary", "linkedin", Salary, 1, &[
        ".job-details-jobs-unified-top-card__job-insight--highlight span",
        ".salary-main-rail__current-range",
    ]),
    // Indeed
    board("indeed-title", "indeed", Title, 1, &[
        "h1[data-testid=\"jobsearch-JobInfoHeader-title\"]",
        ".jobsearch-JobInfoHeader-title",
    ]),
    board("indeed-company", "indeed", Company, 1, &[
        "[data-testid=\"inlineHeader-companyName\"] a",
        "[data-company-name=\"true\"]",
    ]),
    board("indeed-description", "indeed", Description, 1, &[
        "#jobDescriptionText",
        ".jobsearch-jobDescriptionText",
        ".jobsearch-JobComponent-description",
    ]),
    board("indeed-location", "indeed", Location, 1, &[
        "[data-testid=\"inlineHeader-companyLocation\"]",
        ".jobsearch-JobInfoHeader-subtitle > div:last-child",
    ]),
    board("indeed-salary", "indeed", Salary, 1, &[
        "[data-testid=\"attribute_snippet_testid\"]",
        "#salaryInfoAndJobType",
    ]),
    board("indeed-employment-type", "indeed", EmploymentType, 2, &[
        "#salaryInfoAndJobType .jobsearch-JobInfoHeader-item",
        "[data-testid=\"jobsearch-JobInfoHeader-companyRating\"] ~ div",
    ])
    .notes("kept apart from salary, both share attribute_snippet_testid"),
    // Greenhouse
    board("greenhouse-title", "greenhouse", Title, 1, &[".app-title", "h1.heading"]),
    board("greenhouse-company", "greenhouse", Company, 1, &[".company-name"]),
    board("greenhouse-description", "greenhouse", Description, 1, &[
        "#content",
        ".job-post-description",
        "#job_description",
    ]),
    board("greenhouse-location", "greenhouse", Location, 1, &[".location"]),
    board("greenhouse-location-input", "greenhouse", Location, 2, &[
        "#job_application_location",
        "input[name=\"job_application[location]\"]",
    ])
    .write(),
    board("greenhouse-cover-letter-input", "greenhouse", Description, 2, &[
        "textarea#cover_letter_text",
        "textarea[name=\"job_application[cover_letter_text]\"]",
    ])
    .write(),
    // Lever
    board("lever-title", "lever", Title, 1, &[".posting-headline h2", ".section-header h2"]),
    board("lever-description", "lever", Description, 1, &[
        "[data-testid=\"jobDescription-container\"]",
        ".section-wrapper",
    ]),
    board("lever-location", "lever", Location, 1, &[
        ".posting-categories .sort-by-time .posting-category:first-child",
    ]),
    board("lever-employment-type", "lever", EmploymentType, 1, &[".posting-categories .workplaceTypes"]),
    board("lever-location-input", "lever", Location, 2, &["input[name=\"location\"]"]).write(),
    board("lever-company-input", "lever", Company, 2, &["input[name=\"org\"]"])
        .write()
        .notes("current company on the application form"),
    // Workday
    board("workday-title", "workday", Title, 1, &["[data-automation-id=\"jobPostingHeader\"]"]),
    board("workday-description", "workday", Description, 1, &[
        "[data-automation-id=\"jobPostingDescription\"]",
        ".job-description-container",
    ]),
    // Glassdoor
    board("glassdoor-description", "glassdoor", Description, 1, &[
        "[class*=\"JobDetails_jobDescription\"]",
        ".jobDescriptionContent",
        "[data-test=\"jobDescription\"]",
    ]),
    // ZipRecruiter
    board("ziprecruiter-description", "ziprecruiter", Description, 1, &[
        ".jobDescriptionSection",
        ".job_description",
    ]),
    // Wellfound
    board("wellfound-description", "wellfound", Description, 1, &[
        ".job-details",
        "[class*=\"styles_description\"]",
    ]),
    // SmartRecruiters
    board("smartrecruiters-description", "smartrecruiters", Description, 1, &[".job-sections"]),
    // Ashby
    board("ashby-description", "ashby", Description, 1, &[".ashby-job-posting-description"]),
    // Cross-site fallbacks
    fallback("generic-title", SelectorTier::Generic, Title, 10, &["h1"])
        .notes("broad h1 fallback"),
    fallback("generic-company", SelectorTier::Generic, Company, 10, &[
        "[class*=\"company\"]",
        "[class*=\"employer\"]",
        "[class*=\"organization\"]",
    ]),
    fallback("generic-description", SelectorTier::Generic, Description, 10, &[
        "[data-test=\"job-description-text\"]",
        "[id*=\"job_description\"]",
        "[id*=\"job-description\"]",
        "[class*=\"job-description\"]",
        "[class*=\"jobDescription\"]",
        "[class*=\"description\"]",
        "article",
        "main",
    ])
    .notes("broadest selectors last"),
    fallback("generic-location", SelectorTier::Generic, Location, 10, &[
        "[class*=\"location\"]",
        "[class*=\"jobLocation\"]",
    ]),
    fallback("generic-salary", SelectorTier::Generic, Salary, 10, &[
        "[class*=\"salary\"]",
        "[class*=\"compensation\"]",
    ]),
    // Last resort, read-only
    fallback("heuristic-title", SelectorTier::Heuristic, Title, 20, &["[role=\"heading\"]", "h2"]),
    fallback("heuristic-company", SelectorTier::Heuristic, Company, 20, &[
        "[class*=\"brand\"]",
        "[class*=\"org\"]",
    ]),
    fallback("heuristic-description", SelectorTier::Heuristic, Description, 20, &[
        "[role=\"main\"] p",
        "article p",
        ".content p",
    ])
    .notes("paragraph-level fallback"),
    fallback("heuristic-location", SelectorTier::Heuristic, Location, 20, &[
        "[class*=\"address\"]",
        "[class*=\"region\"]",
    ]),
];

pub(super) fn entries() -> Vec<SelectorEntry> {
    let added = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap_or_default();
    RULES
        .iter()
        .map(|rule| SelectorEntry {
            id: rule.id.to_string(),
            board: rule.board.to_string(),
            field: rule.field,
            selectors: rule.selectors.iter().map(|s| s.to_string()).collect(),
            priority: rule.priority,
            status: EntryStatus::Active,
            added,
            tier: rule.tier,
            mode: rule.mode,
            notes: rule.notes.map(str::to_string),
        })
        .collect()
}
