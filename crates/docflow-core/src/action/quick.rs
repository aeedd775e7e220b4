//! Quick deletion ("qd"): tag the page with one or more criteria, tell the
//! creator, and keep a personal log.
//!
//! | task             | deps                               |
//! |------------------|------------------------------------|
//! | `tag-document`   |                                    |
//! | `creator-lookup` |                                    |
//! | `notify-creator` | `tag-document`, `creator-lookup`   |
//! | `log-entry`      | `tag-document`, `creator-lookup`   |

use std::sync::Arc;

use super::policy::{creator_from, ActionPolicy, Step, StepOutput, TaskSpec};
use super::steps;
use crate::config::{DocflowConfig, WatchConfig};
use crate::conflict::{catalog, ConflictCheck, MarkerSet, OnConflict};
use crate::domain::{ActionError, ActionParams, Criterion, DocumentId};
use crate::ports::CreateOption;
use crate::session::{AppendSection, AppendText, Fallback, MutationRequest, TagDocument};

pub const KIND: &str = "qd";

/// Criterion code that carries a free-form rationale instead of a fixed reason.
const CUSTOM: &str = "db";

const LOG_HEADER: &str = "This is a log of all [[WP:QD|quick deletion]] nominations made by this user.";

pub struct QuickDeletionPolicy {
    watch: WatchConfig,
    log_page: Option<DocumentId>,
    unlogged: Vec<String>,
    existing_tag: ConflictCheck,
    deletion_process: ConflictCheck,
    commons_move: Arc<MarkerSet>,
}

impl QuickDeletionPolicy {
    pub fn new(config: &DocflowConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            watch: config.watch.clone(),
            log_page: config.venues.quick_deletion_log.as_deref().map(DocumentId::new),
            unlogged: config
                .venues
                .unlogged_criteria
                .iter()
                .map(|c| c.trim().to_lowercase())
                .collect(),
            existing_tag: ConflictCheck::new(
                Arc::new(catalog::existing_quick_deletion()?),
                catalog::QUICK_DELETION_AGAIN_PROMPT,
                OnConflict::KeepOrAbort,
            ),
            deletion_process: ConflictCheck::new(
                Arc::new(catalog::existing_deletion_process()?),
                catalog::DELETION_PROCESS_PROMPT,
                OnConflict::KeepOrAbort,
            ),
            commons_move: Arc::new(catalog::commons_move_tags()?),
        })
    }

    fn tag_document(&self) -> Step {
        let checks = [self.existing_tag.clone(), self.deletion_process.clone()];
        let commons_move = self.commons_move.clone();
        let watch = self.watch.tagged_page;
        Step::mutate(move |params, _| {
            let target = &params.target;
            let watch = watch || params.watch;
            let code = tagging_code(params)?;

            let fallback = Fallback::new(
                AppendSection {
                    title: format!("{target} nominated for QD, request deletion"),
                    body: format!("{code}\n\nI was unable to tag {target} so please delete it. ~~~~"),
                },
                format!("Requesting quick deletion of [[:{target}]]."),
            )
            .watched(watch);

            let intent = TagDocument::new(code)
                .noinclude(params.noinclude)
                .redact(params.criteria.iter().any(|c| c.redact))
                .superseding_on_files(commons_move.clone());

            let request = checks.iter().cloned().fold(
                MutationRequest::new(target.clone(), intent, summary(params)).watched(watch),
                MutationRequest::with_check,
            );
            Ok(Some(request.with_fallback(fallback)))
        })
    }

    fn log_entry(&self) -> Step {
        let log_page = self.log_page.clone();
        let unlogged = self.unlogged.clone();
        Step::mutate(move |params, inputs| {
            let Some(log_page) = &log_page else {
                return Ok(None);
            };
            if params.criteria.iter().all(|c| unlogged.contains(&c.code)) {
                return Ok(None);
            }

            let request = MutationRequest::new(
                log_page.clone(),
                AppendText {
                    line: log_line(params, creator_from(inputs)),
                    header: Some(LOG_HEADER.to_string()),
                },
                log_summary(params),
            )
            .create(CreateOption::Recreate);
            Ok(Some(request))
        })
    }
}

impl ActionPolicy for QuickDeletionPolicy {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn label(&self) -> &str {
        "Request quick deletion (QD)"
    }

    fn validate(&self, params: &ActionParams) -> Result<(), ActionError> {
        if params.criteria.is_empty() {
            return Err(ActionError::InvalidParams("select at least one criterion".to_string()));
        }
        if params.criteria.iter().any(|c| c.code == CUSTOM) {
            if params.criteria.len() > 1 {
                return Err(ActionError::InvalidParams(
                    "a custom rationale cannot be combined with other criteria".to_string(),
                ));
            }
            if params.trimmed_rationale().is_none() {
                return Err(ActionError::InvalidParams("You must specify a reason".to_string()));
            }
        }
        Ok(())
    }

    fn plan(&self, _params: &ActionParams) -> Vec<TaskSpec> {
        vec![
            TaskSpec::new("tag-document", &[], self.tag_document()),
            TaskSpec::new("creator-lookup", &[], steps::creator_lookup()),
            TaskSpec::new(
                "notify-creator",
                &["tag-document", "creator-lookup"],
                steps::notify_creator(notice),
            ),
            TaskSpec::new("log-entry", &["tag-document", "creator-lookup"], self.log_entry()),
        ]
    }
}

fn is_custom(params: &ActionParams) -> bool {
    matches!(params.criteria.as_slice(), [only] if only.code == CUSTOM)
}

fn custom_rationale(params: &ActionParams) -> Result<&str, ActionError> {
    params
        .trimmed_rationale()
        .ok_or_else(|| ActionError::InvalidParams("You must specify a reason".to_string()))
}

/// `{{qd|g1|...|editor=..|date=~~~~~}}` for one criterion, `{{QD-multiple|G1|A1|...}}` otherwise.
fn tagging_code(params: &ActionParams) -> Result<String, ActionError> {
    let tag = match params.criteria.as_slice() {
        [] => return Err(ActionError::InvalidParams("select at least one criterion".to_string())),
        [only] => {
            let rationale = if only.code == CUSTOM {
                format!("|1={}", custom_rationale(params)?)
            } else {
                String::new()
            };
            let parameters: String = only
                .parameters
                .iter()
                .map(|(name, value)| format!("|{name}={value}"))
                .collect();
            format!(
                "{{{{qd|{}{rationale}{parameters}|editor={}|date=~~~~~}}}}",
                only.code, params.requested_by
            )
        }
        many => {
            // QD-multiple only understands named parameters
            let criteria: String = many
                .iter()
                .map(|criterion| {
                    let parameters: String = named_parameters(criterion)
                        .map(|(name, value)| format!("|{name}={value}"))
                        .collect();
                    format!("|{}{parameters}", criterion.code.to_uppercase())
                })
                .collect();
            format!("{{{{QD-multiple{criteria}}}}}")
        }
    };

    Ok(if params.request_salt {
        format!("{{{{salt}}}}\n{tag}")
    } else {
        tag
    })
}

fn named_parameters(criterion: &Criterion) -> impl Iterator<Item = (&String, &String)> {
    criterion
        .parameters
        .iter()
        .filter(|(name, _)| name.parse::<u32>().is_err())
}

fn summary(params: &ActionParams) -> String {
    if is_custom(params) {
        let rationale = params.trimmed_rationale().unwrap_or_default();
        return format!("Requesting [[WP:QD|quick deletion]] with rationale \"{rationale}\".");
    }
    let criteria = params
        .criteria
        .iter()
        .map(|c| {
            let code = c.code.to_uppercase();
            format!("[[WP:QD#{code}|QD {code}]]")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("Requesting quick deletion ({criteria}).")
}

fn notice(params: &ActionParams, _inputs: &[StepOutput]) -> String {
    let page = &params.target;
    match params.criteria.as_slice() {
        [only] => format!("{{{{subst:QD-notice|page={page}|cat={}}}}} ~~~~", only.code),
        many => {
            let criteria: String = many
                .iter()
                .enumerate()
                .map(|(idx, criterion)| format!("|{}={}", idx + 2, criterion.code.to_uppercase()))
                .collect();
            format!("{{{{subst:QD-notice-multiple|page={page}{criteria}}}}} ~~~~")
        }
    }
}

fn redacted(params: &ActionParams) -> bool {
    params.criteria.iter().any(|c| c.redact)
}

fn log_summary(params: &ActionParams) -> String {
    if redacted(params) {
        "Logging quick deletion nomination of an attack page.".to_string()
    } else {
        format!("Logging quick deletion nomination of [[:{}]].", params.target)
    }
}

/// One numbered line for the user's quick deletion log.
fn log_line(params: &ActionParams, creator: Option<&str>) -> String {
    let target = &params.target;
    // attack pages are not named in the log
    let mut line = if redacted(params) {
        format!("# [[:{target}|This]] attack page: ")
    } else {
        format!("# [[:{target}]]: ")
    };

    match params.criteria.as_slice() {
        [only] if only.code == CUSTOM => line.push_str("{{tl|QD}}"),
        [only] => {
            let code = only.code.to_uppercase();
            line.push_str(&format!("[[WP:QD#{code}|QD {code}]] ({{{{tl|db-{}}}}})", only.code));
        }
        many => {
            let criteria = many
                .iter()
                .map(|c| {
                    let code = c.code.to_uppercase();
                    format!("[[WP:QD#{code}|{code}]]")
                })
                .collect::<Vec<_>>()
                .join(", ");
            line.push_str(&format!("multiple criteria ({criteria})"));
        }
    }

    if params.request_salt {
        line.push_str("; requested creation protection ([[WP:SALT|salting]])");
    }

    let extra: Vec<String> = if is_custom(params) {
        vec![format!("{{Custom rationale: {}}}", params.trimmed_rationale().unwrap_or_default())]
    } else {
        params
            .criteria
            .iter()
            .flat_map(|criterion| {
                let code = criterion.code.to_uppercase();
                criterion
                    .parameters
                    .iter()
                    .map(move |(name, value)| format!("{{{code} {name}: {value}}}"))
            })
            .collect()
    };
    if !extra.is_empty() {
        line.push_str(&format!("; additional information: {}", extra.join(" ")));
    }

    match creator {
        Some(creator) if params.notify_creator && creator != params.requested_by => {
            line.push_str(&format!("; notified {{{{user|1={creator}}}}}"));
        }
        _ => {}
    }
    line.push_str(" ~~~~~");
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;
    use rstest::rstest;

    fn policy() -> QuickDeletionPolicy {
        let mut config = DocflowConfig::default();
        config.venues.quick_deletion_log = Some("User:Ferris/QD log".to_string());
        config.venues.unlogged_criteria = vec!["G7".to_string()];
        QuickDeletionPolicy::new(&config).unwrap()
    }

    fn params(codes: &[&str]) -> ActionParams {
        codes
            .iter()
            .fold(ActionParams::new("Rust", "Ferris"), |p, code| p.with_criterion(Criterion::new(*code)))
    }

    #[rstest]
    #[case::no_criteria(params(&[]), "select at least one criterion")]
    #[case::custom_without_reason(params(&["db"]), "You must specify a reason")]
    #[case::custom_mixed(params(&["db", "g1"]).with_rationale("junk"), "cannot be combined")]
    fn invalid_parameters_are_rejected(#[case] params: ActionParams, #[case] message: &str) {
        let err = policy().validate(&params).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParams);
        assert!(err.to_string().contains(message), "{err}");
    }

    #[test]
    fn single_criterion_code_names_the_editor() {
        let params = ActionParams::new("Rust", "Ferris")
            .with_criterion(Criterion::new("a1").with_parameter("url", "https://example.org"));
        assert_eq!(
            tagging_code(&params).unwrap(),
            "{{qd|a1|url=https://example.org|editor=Ferris|date=~~~~~}}"
        );
    }

    #[test]
    fn multiple_criteria_skip_numeric_parameters() {
        let params = ActionParams::new("Rust", "Ferris")
            .with_criterion(Criterion::new("g1"))
            .with_criterion(Criterion::new("a1").with_parameter("1", "x").with_parameter("url", "u"))
            .with_salt(true);
        assert_eq!(tagging_code(&params).unwrap(), "{{salt}}\n{{QD-multiple|G1|A1|url=u}}");
    }

    #[test]
    fn custom_rationale_goes_into_code_and_summary() {
        let params = params(&["db"]).with_rationale(" obvious hoax ");
        assert_eq!(
            tagging_code(&params).unwrap(),
            "{{qd|db|1=obvious hoax|editor=Ferris|date=~~~~~}}"
        );
        assert_eq!(
            summary(&params),
            "Requesting [[WP:QD|quick deletion]] with rationale \"obvious hoax\"."
        );
    }

    #[test]
    fn summary_lists_each_criterion() {
        assert_eq!(
            summary(&params(&["g1", "a1"])),
            "Requesting quick deletion ([[WP:QD#G1|QD G1]], [[WP:QD#A1|QD A1]])."
        );
    }

    #[rstest]
    #[case(&["g1"], "{{subst:QD-notice|page=Rust|cat=g1}} ~~~~")]
    #[case(&["g1", "a1"], "{{subst:QD-notice-multiple|page=Rust|2=G1|3=A1}} ~~~~")]
    fn notices(#[case] codes: &[&str], #[case] expected: &str) {
        assert_eq!(notice(&params(codes), &[]), expected);
    }

    #[test]
    fn notification_and_log_wait_for_the_tag() {
        let plan = policy().plan(&params(&["g1"]));
        let rows: Vec<(&str, Vec<&str>)> = plan.iter().map(|t| (t.name, t.deps.clone())).collect();
        assert_eq!(
            rows,
            vec![
                ("tag-document", vec![]),
                ("creator-lookup", vec![]),
                ("notify-creator", vec!["tag-document", "creator-lookup"]),
                ("log-entry", vec!["tag-document", "creator-lookup"]),
            ]
        );
    }

    #[test]
    fn custom_rationale_is_logged_as_additional_information() {
        let params = params(&["db"]).with_rationale("hoax");
        assert_eq!(
            log_line(&params, None),
            "# [[:Rust]]: {{tl|QD}}; additional information: {Custom rationale: hoax} ~~~~~"
        );
    }

    #[test]
    fn log_line_mentions_salt_and_creator() {
        let params = ActionParams::new("Rust", "Ferris")
            .with_criterion(Criterion::new("a1").with_parameter("url", "u"))
            .with_salt(true);
        assert_eq!(
            log_line(&params, Some("Crab")),
            "# [[:Rust]]: [[WP:QD#A1|QD A1]] ({{tl|db-a1}}); requested creation protection \
             ([[WP:SALT|salting]]); additional information: {A1 url: u}; notified {{user|1=Crab}} ~~~~~"
        );
    }

    #[test]
    fn attack_pages_are_not_named_in_the_log() {
        let params = ActionParams::new("Rust", "Ferris").with_criterion(Criterion::new("g10").redacting());
        assert!(log_line(&params, None).starts_with("# [[:Rust|This]] attack page: "));
        assert_eq!(log_summary(&params), "Logging quick deletion nomination of an attack page.");
    }

    #[test]
    fn unlogged_criteria_skip_the_log() {
        let Step::Mutate(build) = policy().log_entry() else {
            panic!("log-entry is a mutation");
        };
        let inputs = [StepOutput::Done, StepOutput::Creator(None)];
        assert!(build(&params(&["g7"]), &inputs[..]).unwrap().is_none());

        let request = build(&params(&["g7", "a1"]), &inputs[..]).unwrap().unwrap();
        assert_eq!(request.target.as_str(), "User:Ferris/QD log");
        assert_eq!(request.options.create, CreateOption::Recreate);
    }

    #[test]
    fn no_log_page_means_no_log() {
        let policy = QuickDeletionPolicy::new(&DocflowConfig::default()).unwrap();
        let Step::Mutate(build) = policy.log_entry() else {
            panic!("log-entry is a mutation");
        };
        assert!(build(&params(&["g1"]), &[]).unwrap().is_none());
    }

    #[test]
    fn tag_request_keeps_or_aborts_on_existing_tags() {
        let Step::Mutate(build) = policy().tag_document() else {
            panic!("tag-document is a mutation");
        };
        let request = build(&params(&["g1"]), &[]).unwrap().unwrap();
        assert_eq!(request.checks.len(), 2);
        assert!(request.checks.iter().all(|c| c.on_conflict == OnConflict::KeepOrAbort));
        assert!(request.fallback.is_some());
    }
}
