use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use headless_chrome::{Browser, Element, LaunchOptions};
use tracing::{info, warn};

use crate::config::Config;
use crate::model::{title_slug, JobRecord};

const NAV_TIMEOUT: Duration = Duration::from_secs(60);
const LISTING_WAIT: Duration = Duration::from_secs(10);

const SPECIALITY_LABEL: &str = "Specialty:";
const SALARY_LABEL: &str = "Salary:";

/// Structural selectors tied to the search results markup. A site redesign
/// breaks these silently (zero or malformed records), not loudly.
pub struct Selectors {
    pub listing: &'static str,
    pub title: &'static str,
    pub grade: &'static str,
    pub employer: &'static str,
    pub location: &'static str,
    pub speciality: &'static str,
    pub salary: &'static str,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            listing: r#"li[data-test="search-result"]"#,
            title: r#"a[data-test="search-result-job-title"]"#,
            grade: r#"li[data-test="search-result-band"]"#,
            employer: r#"div[data-test="search-result-publisher"]"#,
            location: r#"div[data-test="search-result-location"]"#,
            speciality: r#"li[data-test="search-result-specialty"]"#,
            salary: r#"li[data-test="search-result-salary"]"#,
        }
    }
}

/// Raw text pulled from one listing element before any cleanup.
#[derive(Debug, Default)]
pub struct RawListing {
    pub title: String,
    pub href: String,
    pub grade: String,
    pub employer: String,
    pub location: String,
    pub speciality: String,
    pub salary: String,
}

/// Drive a browser to the search page and map every visible listing element
/// to a record. All-or-nothing at the page level: navigation failure aborts
/// the run, while missing fields inside a found listing degrade to empty
/// strings. The browser closes on drop whichever way this returns.
pub fn scrape_listings(cfg: &Config) -> Result<Vec<JobRecord>> {
    let selectors = Selectors::default();

    let options = LaunchOptions::default_builder()
        .headless(cfg.headless)
        .build()
        .map_err(|e| anyhow!("building browser launch options: {e}"))?;
    let browser = Browser::new(options).context("launching browser")?;
    let tab = browser.new_tab().context("opening tab")?;
    tab.set_default_timeout(NAV_TIMEOUT);

    info!("navigating to {}", cfg.search_url);
    tab.navigate_to(&cfg.search_url)
        .context("navigating to search page")?;
    tab.wait_until_navigated().context("waiting for page load")?;

    // Bounded wait for the first listing; an empty results page is a valid
    // outcome, so a timeout here is not fatal.
    if tab
        .wait_for_element_with_custom_timeout(selectors.listing, LISTING_WAIT)
        .is_err()
    {
        warn!(
            "no listing element appeared within {}s, proceeding with whatever rendered",
            LISTING_WAIT.as_secs()
        );
    }

    let elements = tab.find_elements(selectors.listing).unwrap_or_default();
    info!("found {} listing elements", elements.len());

    let scraped_at = Utc::now();
    let mut records = Vec::new();
    for element in &elements {
        if let Some(record) = build_record(read_listing(element, &selectors), &cfg.base_url, scraped_at) {
            records.push(record);
        }
    }

    info!("extracted {} records ({} skipped)", records.len(), elements.len() - records.len());
    Ok(records)
}

fn read_listing(element: &Element, sel: &Selectors) -> RawListing {
    RawListing {
        title: child_text(element, sel.title),
        href: child_href(element, sel.title),
        grade: child_text(element, sel.grade),
        employer: child_text(element, sel.employer),
        location: child_text(element, sel.location),
        speciality: child_text(element, sel.speciality),
        salary: child_text(element, sel.salary),
    }
}

fn child_text(element: &Element, selector: &str) -> String {
    element
        .find_element(selector)
        .and_then(|child| child.get_inner_text())
        .map(|text| text.trim().to_string())
        .unwrap_or_default()
}

fn child_href(element: &Element, selector: &str) -> String {
    element
        .find_element(selector)
        .ok()
        .and_then(|child| attr_value(&child, "href"))
        .unwrap_or_default()
}

// get_attributes returns a flat [name, value, name, value, ...] list.
fn attr_value(element: &Element, name: &str) -> Option<String> {
    let attrs = element.get_attributes().ok()??;
    attrs
        .chunks_exact(2)
        .find(|pair| pair[0] == name)
        .map(|pair| pair[1].clone())
}

/// Assemble a record from raw listing text. Title is the only mandatory
/// field: an empty title drops the listing (filters decorative or malformed
/// entries).
pub fn build_record(raw: RawListing, base_url: &str, scraped_at: DateTime<Utc>) -> Option<JobRecord> {
    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return None;
    }

    Some(JobRecord {
        id: record_id(&raw.href, &title),
        link: resolve_link(&raw.href, base_url),
        title,
        grade: raw.grade,
        employer: raw.employer,
        location: raw.location,
        speciality: strip_label(&raw.speciality, SPECIALITY_LABEL),
        salary: strip_label(&raw.salary, SALARY_LABEL),
        scraped_at,
    })
}

/// Detail-page path with the query string removed, falling back to a title
/// slug when the listing carried no href.
fn record_id(href: &str, title: &str) -> String {
    let path = href.split('?').next().unwrap_or_default();
    if path.is_empty() {
        title_slug(title)
    } else {
        path.to_string()
    }
}

/// Site-relative hrefs get the base URL prefixed; anything else passes
/// through verbatim.
fn resolve_link(href: &str, base_url: &str) -> String {
    if href.starts_with('/') {
        format!("{base_url}{href}")
    } else {
        href.to_string()
    }
}

fn strip_label(text: &str, label: &str) -> String {
    let text = text.trim();
    text.strip_prefix(label).unwrap_or(text).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.jobs.nhs.uk";

    fn raw(title: &str, href: &str) -> RawListing {
        RawListing {
            title: title.to_string(),
            href: href.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn empty_title_drops_listing() {
        let mut listing = raw("", "/candidate/jobadvert/C9999");
        listing.salary = "Salary: £50,000".to_string();
        assert!(build_record(listing, BASE, Utc::now()).is_none());
    }

    #[test]
    fn whitespace_title_drops_listing() {
        assert!(build_record(raw("   ", "/candidate/jobadvert/C9999"), BASE, Utc::now()).is_none());
    }

    #[test]
    fn id_strips_query_string() {
        let record =
            build_record(raw("Consultant", "/candidate/jobadvert/C9999?searchSession=42"), BASE, Utc::now())
                .unwrap();
        assert_eq!(record.id, "/candidate/jobadvert/C9999");
    }

    #[test]
    fn empty_href_falls_back_to_title_slug() {
        let record = build_record(raw("Specialty Doctor (Dermatology)", ""), BASE, Utc::now()).unwrap();
        assert_eq!(record.id, "specialty-doctor-dermatology");
    }

    #[test]
    fn fallback_id_is_deterministic() {
        let a = build_record(raw("Clinical Fellow", ""), BASE, Utc::now()).unwrap();
        let b = build_record(raw("Clinical Fellow", ""), BASE, Utc::now()).unwrap();
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn relative_href_gets_base_url() {
        let record = build_record(raw("Consultant", "/candidate/jobadvert/C9999"), BASE, Utc::now()).unwrap();
        assert_eq!(record.link, "https://www.jobs.nhs.uk/candidate/jobadvert/C9999");
    }

    #[test]
    fn absolute_href_passes_through() {
        let record =
            build_record(raw("Consultant", "https://other.example/job/1"), BASE, Utc::now()).unwrap();
        assert_eq!(record.link, "https://other.example/job/1");
    }

    #[test]
    fn labels_stripped_from_speciality_and_salary() {
        let mut listing = raw("Consultant", "/candidate/jobadvert/C9999");
        listing.speciality = "Specialty: Dermatology".to_string();
        listing.salary = "Salary:  £93,666 to £126,281 a year".to_string();
        let record = build_record(listing, BASE, Utc::now()).unwrap();
        assert_eq!(record.speciality, "Dermatology");
        assert_eq!(record.salary, "£93,666 to £126,281 a year");
    }

    #[test]
    fn unlabelled_text_kept_verbatim() {
        let mut listing = raw("Consultant", "/candidate/jobadvert/C9999");
        listing.salary = "£93,666 a year".to_string();
        let record = build_record(listing, BASE, Utc::now()).unwrap();
        assert_eq!(record.salary, "£93,666 a year");
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record = build_record(raw("Consultant", "/candidate/jobadvert/C9999"), BASE, Utc::now()).unwrap();
        assert_eq!(record.grade, "");
        assert_eq!(record.employer, "");
        assert_eq!(record.location, "");
    }
}
