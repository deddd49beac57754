//! Recommended-service rules.
//!
//! Rules are evaluated in table order and their services concatenated, so
//! the list is stable across runs. Duplicates keep their first position.

/// Facts about one business that the service rules look at.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub has_website: bool,
    pub broken_site: bool,
    pub placeholder_site: bool,
    pub missing_tls: bool,
    pub slow: bool,
    pub low_rating: bool,
    pub few_reviews: bool,
    pub has_email: bool,
    pub has_social: bool,
    /// Lower-cased category tags.
    pub categories: Vec<String>,
}

struct Rule {
    applies: fn(&Signals) -> bool,
    services: &'static [&'static str],
}

const RULES: &[Rule] = &[
    Rule {
        applies: |s| !s.has_website,
        services: &[
            "Website Development",
            "Local SEO",
            "Google Business Profile Setup",
        ],
    },
    Rule {
        applies: |s| s.broken_site,
        services: &["Website Repair", "Website Maintenance Plan"],
    },
    Rule {
        applies: |s| s.placeholder_site,
        services: &["Website Development", "Content Creation"],
    },
    Rule {
        applies: |s| s.missing_tls,
        services: &["SSL Setup"],
    },
    Rule {
        applies: |s| s.slow,
        services: &["Performance Optimization"],
    },
    Rule {
        applies: |s| s.low_rating,
        services: &["Reputation Management", "Customer Experience Consulting"],
    },
    Rule {
        applies: |s| s.few_reviews,
        services: &["Review Management", "Reputation Management"],
    },
    Rule {
        applies: |s| !s.has_email,
        services: &["Email Marketing Setup", "CRM Integration"],
    },
    Rule {
        applies: |s| !s.has_social,
        services: &["Social Media Marketing", "Social Profile Creation"],
    },
    Rule {
        applies: |s| has_category(s, &["restaurant", "food"]),
        services: &[
            "Online Ordering Setup",
            "Menu Design",
            "Food Delivery Integration",
        ],
    },
    Rule {
        applies: |s| has_category(s, &["real estate"]),
        services: &[
            "Property Listing Website",
            "Virtual Tour Creation",
            "Lead Generation Ads",
        ],
    },
    Rule {
        applies: |s| has_category(s, &["salon", "spa"]),
        services: &[
            "Online Booking System",
            "Instagram Marketing",
            "Loyalty Program Setup",
        ],
    },
    Rule {
        applies: |s| has_category(s, &["lawyer", "legal", "attorney"]),
        services: &[
            "Legal Blog Content",
            "Lead Capture Forms",
            "Google Ads for Legal",
        ],
    },
    Rule {
        applies: |s| has_category(s, &["contractor", "construction"]),
        services: &[
            "Project Portfolio Website",
            "Google Local Service Ads",
            "Review Generation Campaigns",
        ],
    },
    Rule {
        applies: |s| has_category(s, &["medical", "doctor", "clinic", "dentist", "dental"]),
        services: &[
            "Appointment Scheduling",
            "HIPAA-Compliant Forms",
            "Healthcare SEO",
        ],
    },
];

/// Deduplicated, order-stable list of services for `signals`.
#[must_use]
pub fn recommend(signals: &Signals) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for rule in RULES.iter().filter(|rule| (rule.applies)(signals)) {
        for service in rule.services {
            if !out.iter().any(|s| s == service) {
                out.push((*service).to_string());
            }
        }
    }
    out
}

/// Multi-word keywords match as substrings; single words must match a whole
/// word of the tag, optionally pluralised.
fn has_category(signals: &Signals, keywords: &[&str]) -> bool {
    signals.categories.iter().any(|category| {
        keywords.iter().any(|keyword| {
            if keyword.contains(' ') {
                category.contains(keyword)
            } else {
                category
                    .split(|c: char| !c.is_alphanumeric())
                    .any(|word| word == *keyword || word.strip_suffix('s') == Some(*keyword))
            }
        })
    })
}
