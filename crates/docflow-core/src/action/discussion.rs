//! Deletion discussion ("rfd"): tag the page, open a discussion, list it,
//! and tell the page's creator.
//!
//! | task                | deps                                                |
//! |---------------------|-----------------------------------------------------|
//! | `discussion-page`   |                                                     |
//! | `tag-document`      | `discussion-page`                                   |
//! | `list-entry`        | `discussion-page`, `tag-document`                   |
//! | `discussion-record` | `discussion-page`, `tag-document`                   |
//! | `creator-lookup`    |                                                     |
//! | `notify-creator`    | `discussion-page`, `tag-document`, `creator-lookup` |
//!
//! 対象が存在しない、または既存タグの置き換えを断った場合は `tag-document` が失敗し、
//! 後続の書き込みと通知はすべて取り消される。

use std::sync::Arc;

use chrono::Datelike;
use futures::FutureExt;
use regex::Regex;

use super::policy::{discussion_from, ActionPolicy, Step, StepContext, StepOutput, TaskSpec};
use super::steps;
use crate::config::{DocflowConfig, VenueConfig, WatchConfig};
use crate::conflict::{catalog, ConflictCheck, OnConflict};
use crate::domain::{ActionError, ActionParams, DocumentId};
use crate::ports::CreateOption;
use crate::session::{AppendSection, Fallback, InsertAfterAnchor, MutationRequest, ReplaceText, TagDocument};

pub const KIND: &str = "rfd";

pub struct DiscussionPolicy {
    venues: VenueConfig,
    watch: WatchConfig,
    list_anchor: Regex,
    existing_discussion: ConflictCheck,
    quick_deletion: ConflictCheck,
}

impl DiscussionPolicy {
    /// Fails only if a marker pattern does not compile.
    pub fn new(config: &DocflowConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            venues: config.venues.clone(),
            watch: config.watch.clone(),
            list_anchor: Regex::new(&format!("({}\n+)", regex::escape(&config.venues.list_anchor)))?,
            existing_discussion: ConflictCheck::new(
                Arc::new(catalog::discussion_tag()?),
                catalog::DISCUSSION_TAG_PROMPT,
                OnConflict::StripOrAbort,
            ),
            quick_deletion: ConflictCheck::new(
                Arc::new(catalog::quick_deletion_tags()?),
                catalog::QUICK_DELETION_STRIP_PROMPT,
                OnConflict::StripOrKeep,
            ),
        })
    }

    fn tag_document(&self) -> Step {
        let checks = [self.existing_discussion.clone(), self.quick_deletion.clone()];
        let watch = self.watch.tagged_page;
        Step::mutate(move |params, inputs| {
            let (page, _) = discussion_from(inputs)?;
            let reason = reason(params)?;
            let target = &params.target;
            let watch = watch || params.watch;

            let tag = format!("{{{{RfD|1={reason}}}}}");
            let fallback = Fallback::new(
                AppendSection {
                    title: format!("Deletion nomination of [[:{target}]]"),
                    body: format!(
                        "{{{{edit protected|answered=no}}}}\nPlease add <code><nowiki>{tag}</nowiki></code> \
                         to the top of [[:{target}]]; the discussion is at [[:{page}]]. ~~~~"
                    ),
                },
                format!("Requesting the deletion tag on [[:{target}]]."),
            )
            .watched(watch);

            let request = checks.iter().cloned().fold(
                MutationRequest::new(
                    target.clone(),
                    TagDocument::new(tag).noinclude(params.noinclude),
                    format!("Nominated for deletion; see [[:{page}]]."),
                )
                .watched(watch),
                MutationRequest::with_check,
            );
            Ok(Some(request.with_fallback(fallback)))
        })
    }

    fn list_entry(&self) -> Step {
        let list = DocumentId::new(self.venues.discussion_list.as_str());
        let anchor = self.list_anchor.clone();
        let watch = self.watch.list;
        Step::mutate(move |_params, inputs| {
            let (page, _) = discussion_from(inputs)?;
            let request = MutationRequest::new(
                list.clone(),
                InsertAfterAnchor::new(anchor.clone(), format!("{{{{{page}}}}}")),
                format!("Adding [[:{page}]]."),
            )
            .create(CreateOption::Recreate)
            .watched(watch);
            Ok(Some(request))
        })
    }

    fn discussion_record(&self) -> Step {
        let watch = self.watch.discussion;
        Step::mutate(move |params, inputs| {
            let (page, _) = discussion_from(inputs)?;
            let reason = reason(params)?;
            let request = MutationRequest::new(
                page.clone(),
                ReplaceText(format!("{{{{subst:RfD/Preload/Template|deletereason={reason}}}}}")),
                format!("Creating deletion discussion page for [[:{}]].", params.target),
            )
            .create(CreateOption::CreateOnly)
            .watched(watch);
            Ok(Some(request))
        })
    }

    fn discussion_page(&self) -> Step {
        let prefix = self.venues.discussion_prefix.clone();
        let max = self.venues.max_nominations.max(1);
        Step::custom(move |ctx, _| determine_discussion(ctx, prefix.clone(), max).boxed())
    }
}

impl ActionPolicy for DiscussionPolicy {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn label(&self) -> &str {
        "Nominate for deletion (RfD)"
    }

    fn validate(&self, params: &ActionParams) -> Result<(), ActionError> {
        reason(params).map(|_| ())
    }

    fn plan(&self, _params: &ActionParams) -> Vec<TaskSpec> {
        vec![
            TaskSpec::new("discussion-page", &[], self.discussion_page()),
            TaskSpec::new("tag-document", &["discussion-page"], self.tag_document()),
            TaskSpec::new("list-entry", &["discussion-page", "tag-document"], self.list_entry()),
            TaskSpec::new(
                "discussion-record",
                &["discussion-page", "tag-document"],
                self.discussion_record(),
            ),
            TaskSpec::new("creator-lookup", &[], steps::creator_lookup()),
            TaskSpec::new(
                "notify-creator",
                &["discussion-page", "tag-document", "creator-lookup"],
                steps::notify_creator(notice),
            ),
        ]
    }
}

fn reason(params: &ActionParams) -> Result<&str, ActionError> {
    params
        .trimmed_rationale()
        .ok_or_else(|| ActionError::InvalidParams("a deletion rationale is required".to_string()))
}

/// `{prefix}/{year}/{target}`, or the first free `({n} nomination)` variant.
async fn determine_discussion(ctx: StepContext, prefix: String, max: u32) -> Result<StepOutput, ActionError> {
    let base = format!("{prefix}/{}/{}", ctx.clock.now().year(), ctx.params.target);
    let store = ctx.session.store().clone();

    for n in 1..=max {
        let numbering = if n == 1 {
            String::new()
        } else {
            format!(" ({} nomination)", ordinal(n))
        };
        let page = DocumentId::new(format!("{base}{numbering}"));
        let doc = store.load(&page).await.map_err(|e| e.into_action(&page))?;
        if !doc.exists() {
            tracing::info!(discussion = %page, "discussion page determined");
            return Ok(StepOutput::Discussion { page, numbering });
        }
        tracing::debug!(discussion = %page, "discussion page already exists");
    }
    Err(ActionError::failed(format!("{base} already has {max} discussions")))
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Repeat nominations carry their numbering as `order`.
fn notice(params: &ActionParams, inputs: &[StepOutput]) -> String {
    let target = &params.target;
    let order = match discussion_from(inputs) {
        Ok((_, numbering)) if !numbering.is_empty() => format!("|order=&#32;{numbering}"),
        _ => String::new(),
    };
    format!("{{{{subst:RFDNote|1={target}|2={target}{order}}}}} ~~~~")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(2, "2nd")]
    #[case(3, "3rd")]
    #[case(4, "4th")]
    #[case(11, "11th")]
    #[case(21, "21st")]
    fn ordinals(#[case] n: u32, #[case] expected: &str) {
        assert_eq!(ordinal(n), expected);
    }

    #[test]
    fn plan_follows_the_task_table() {
        let policy = DiscussionPolicy::new(&DocflowConfig::default()).unwrap();
        let params = ActionParams::new("Rust", "Ferris").with_rationale("not notable");
        let plan = policy.plan(&params);

        let rows: Vec<(&str, Vec<&str>)> = plan.iter().map(|t| (t.name, t.deps.clone())).collect();
        assert_eq!(
            rows,
            vec![
                ("discussion-page", vec![]),
                ("tag-document", vec!["discussion-page"]),
                ("list-entry", vec!["discussion-page", "tag-document"]),
                ("discussion-record", vec!["discussion-page", "tag-document"]),
                ("creator-lookup", vec![]),
                ("notify-creator", vec!["discussion-page", "tag-document", "creator-lookup"]),
            ]
        );
    }

    #[test]
    fn rationale_is_required() {
        let policy = DiscussionPolicy::new(&DocflowConfig::default()).unwrap();
        let err = policy.validate(&ActionParams::new("Rust", "Ferris").with_rationale("  ")).unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::InvalidParams);
    }

    #[test]
    fn tag_request_carries_both_checks_and_a_fallback() {
        let policy = DiscussionPolicy::new(&DocflowConfig::default()).unwrap();
        let params = ActionParams::new("Rust", "Ferris").with_rationale("not notable");
        let inputs = [StepOutput::Discussion {
            page: DocumentId::new("Wikipedia:Requests for deletion/Requests/2024/Rust"),
            numbering: String::new(),
        }];

        let Step::Mutate(build) = policy.tag_document() else {
            panic!("tag-document is a mutation");
        };
        let request = build(&params, &inputs[..]).unwrap().unwrap();
        assert_eq!(request.target.as_str(), "Rust");
        assert_eq!(request.checks.len(), 2);
        assert!(request.fallback.is_some());
        assert_eq!(
            request.summary,
            "Nominated for deletion; see [[:Wikipedia:Requests for deletion/Requests/2024/Rust]]."
        );
    }

    fn discussion(numbering: &str) -> StepOutput {
        StepOutput::Discussion {
            page: DocumentId::new(format!("Wikipedia:Requests for deletion/Requests/2024/Rust{numbering}")),
            numbering: numbering.to_string(),
        }
    }

    #[rstest]
    #[case("", "{{subst:RFDNote|1=Rust|2=Rust}} ~~~~")]
    #[case(
        " (2nd nomination)",
        "{{subst:RFDNote|1=Rust|2=Rust|order=&#32; (2nd nomination)}} ~~~~"
    )]
    fn notice_names_the_page_and_its_order(#[case] numbering: &str, #[case] expected: &str) {
        let params = ActionParams::new("Rust", "Ferris");
        let inputs = [discussion(numbering), StepOutput::Done, StepOutput::Creator(Some("Crab".into()))];
        assert_eq!(notice(&params, &inputs), expected);
    }
}
