use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Job listing pages. First match wins, generic career patterns last.
    static ref JOB_BOARD_PATTERNS: Vec<(Regex, &'static str)> = compile(&[
        (r"(?i)linkedin\.com/jobs/view/", "linkedin"),
        (r"(?i)linkedin\.com/jobs/collections/", "linkedin"),
        (r"(?i)linkedin\.com/jobs/search/", "linkedin"),
        // job modal open on the search SPA
        (r"(?i)currentJobId=", "linkedin"),
        (r"(?i)indeed\.com/viewjob", "indeed"),
        (r"(?i)indeed\.com/jobs\?", "indeed"),
        (r"(?i)boards\.greenhouse\.io/.*/jobs/", "greenhouse"),
        (r"(?i)job-boards\.greenhouse\.io", "greenhouse"),
        (r"(?i)jobs\.lever\.co/", "lever"),
        (r"(?i)myworkdayjobs\.com/.*/job/", "workday"),
        (r"(?i)wd\d+\.myworkdaysite\.com", "workday"),
        (r"(?i)glassdoor\.com/job-listing/", "glassdoor"),
        (r"(?i)ziprecruiter\.com/c/.*/job/", "ziprecruiter"),
        (r"(?i)ziprecruiter\.com/jobs/", "ziprecruiter"),
        (r"(?i)monster\.com/job-openings/", "monster"),
        (r"(?i)wellfound\.com/jobs", "wellfound"),
        (r"(?i)angel\.co/company/.*/jobs", "wellfound"),
        (r"(?i)dice\.com/job-detail/", "dice"),
        (r"(?i)simplyhired\.com/job/", "simplyhired"),
        (r"(?i)careerbuilder\.com/job/", "careerbuilder"),
        (r"(?i)builtin\.com/job/", "builtin"),
        (r"(?i)icims\.com", "icims"),
        (r"(?i)smartrecruiters\.com", "smartrecruiters"),
        (r"(?i)careers\.[^/]+\.com/.*job", "generic"),
        (r"(?i)/careers/.*positions?/", "generic"),
        (r"(?i)/jobs/\d+", "generic"),
    ]);

    // Application form pages, where autofill applies.
    static ref ATS_FORM_PATTERNS: Vec<(Regex, &'static str)> = compile(&[
        (r"(?i)boards\.greenhouse\.io/.*/jobs/\d+", "greenhouse"),
        (r"(?i)job-boards\.greenhouse\.io/.+", "greenhouse"),
        (r"(?i)jobs\.lever\.co/[^/]+/[a-f0-9-]+/apply", "lever"),
        (r"(?i)jobs\.lever\.co/[^/]+/[a-f0-9-]+", "lever"),
        (r"(?i)myworkdayjobs\.com/.*/job/.*/apply", "workday"),
        (r"(?i)myworkdayjobs\.com/.*/job/", "workday"),
        (r"(?i)myworkdaysite\.com/.*/apply", "workday"),
        (r"(?i)myworkdaysite\.com/.+", "workday"),
        (r"(?i)jobs\.ashbyhq\.com/[^/]+/[a-f0-9-]+/application", "ashby"),
        (r"(?i)jobs\.ashbyhq\.com/[^/]+/[a-f0-9-]+", "ashby"),
        (r"(?i)jobs\.smartrecruiters\.com/[^/]+/\d+", "smartrecruiters"),
        (r"(?i)smartrecruiters\.com/.*/apply", "smartrecruiters"),
        (r"(?i)\.icims\.com/", "icims"),
        (r"(?i)apply\.workable\.com/", "workable"),
        (r"(?i)workable\.com/.*/j/", "workable"),
        (r"(?i)bamboohr\.com/.*/jobs/view\.php", "bamboohr"),
        (r"(?i)jobs\.jobvite\.com/.*/job/", "jobvite"),
        (r"(?i)jobvite\.com/.*/apply", "jobvite"),
        (r"(?i)/apply\b", "generic"),
        (r"(?i)/application/", "generic"),
        (r"(?i)/careers/.*apply", "generic"),
    ]);
}

fn compile(table: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    table
        .iter()
        .map(|(pattern, board)| (Regex::new(pattern).unwrap(), *board))
        .collect()
}

fn first_match(table: &[(Regex, &'static str)], url: &str) -> Option<String> {
    table
        .iter()
        .find(|(pattern, _)| pattern.is_match(url))
        .map(|(_, board)| board.to_string())
}

/// Board of a job listing URL, `None` when the URL is not a known job page.
pub fn detect_board(url: &str) -> Option<String> {
    first_match(&JOB_BOARD_PATTERNS, url)
}

/// Whether `url` looks like a job posting page at all.
pub fn is_job_page(url: &str) -> bool {
    detect_board(url).is_some()
}

/// Board of an application form URL.
///
/// Returns `Some("generic")` for pages that look like an unknown ATS form.
pub fn detect_application_form(url: &str) -> Option<String> {
    first_match(&ATS_FORM_PATTERNS, url)
}
