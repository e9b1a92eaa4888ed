//! `PATCH /orders/:id` actions
//!
//! Each action is role-gated, validates its own payload, and is applied to the
//! order in memory. Persisting the result is the caller's job.

use serde::{Deserialize, Serialize};

use super::status::{OrderState, ReviewAction, TransitionError};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{AdminAction, Order, Role};
use crate::util::non_blank;

/// Action-tagged patch body
///
/// ```json
/// { "action": "request_revision", "revisionRequest": "사진을 더 넣어주세요" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum OrderPatch {
    // ===== Staff =====
    /// Free status edit for generic task types
    SetStatus {
        status: String,
        #[serde(default)]
        completed_link: Option<String>,
        #[serde(default)]
        completed_link2: Option<String>,
    },
    UploadDraft {
        draft_text: String,
    },
    ReviseDraft {
        draft_text: String,
        #[serde(default)]
        revision_text: Option<String>,
    },
    Publish {
        completed_link: String,
        #[serde(default)]
        completed_link2: Option<String>,
        #[serde(default)]
        reviewer_name: Option<String>,
    },

    // ===== Owning client =====
    RequestRevision {
        revision_request: String,
    },
    Approve,
    EditDraft {
        revision_text: String,
    },
}

/// Result of a successful patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    pub from: String,
    pub to: String,
    /// Audit action to record; `None` for client-driven steps
    pub audit: Option<AdminAction>,
}

impl OrderPatch {
    pub fn is_staff_action(&self) -> bool {
        match self.review_action() {
            Some(action) => action.is_staff_action(),
            None => true,
        }
    }

    fn review_action(&self) -> Option<ReviewAction> {
        match self {
            OrderPatch::SetStatus { .. } => None,
            OrderPatch::UploadDraft { .. } => Some(ReviewAction::UploadDraft),
            OrderPatch::ReviseDraft { .. } => Some(ReviewAction::ReviseDraft),
            OrderPatch::Publish { .. } => Some(ReviewAction::Publish),
            OrderPatch::RequestRevision { .. } => Some(ReviewAction::RequestRevision),
            OrderPatch::Approve => Some(ReviewAction::Approve),
            OrderPatch::EditDraft { .. } => Some(ReviewAction::EditDraft),
        }
    }

    fn audit_action(&self) -> Option<AdminAction> {
        match self {
            OrderPatch::SetStatus { .. } => Some(AdminAction::OrderStatusUpdate),
            OrderPatch::UploadDraft { .. } | OrderPatch::ReviseDraft { .. } => {
                Some(AdminAction::OrderDraftUpload)
            }
            OrderPatch::Publish { .. } => Some(AdminAction::OrderPublish),
            _ => None,
        }
    }

    fn authorize(&self, order: &Order, actor_id: i64, role: Role) -> AppResult<()> {
        if self.is_staff_action() {
            if !role.is_staff() {
                return Err(AppError::new(ErrorCode::AdminRequired));
            }
        } else if role != Role::Client || order.client_id != actor_id {
            return Err(AppError::forbidden("주문 소유자만 처리할 수 있습니다"));
        }
        Ok(())
    }

    /// Authorize, validate and apply the patch to `order`.
    ///
    /// `order` is left untouched on every error path.
    pub fn apply(
        self,
        order: &mut Order,
        actor_id: i64,
        role: Role,
        now: i64,
    ) -> AppResult<PatchOutcome> {
        self.authorize(order, actor_id, role)?;
        let audit = self.audit_action();
        let from = order.status.clone();

        let next = match (order.state()?, self.review_action()) {
            (OrderState::Generic(_), None) => None,
            (OrderState::Review(_), None) => return Err(TransitionError::ReviewStatusLocked.into()),
            (OrderState::Generic(_), Some(_)) => return Err(TransitionError::NotReviewOrder.into()),
            (OrderState::Review(current), Some(action)) => Some(current.apply(action)?),
        };

        match self {
            OrderPatch::SetStatus {
                status,
                completed_link,
                completed_link2,
            } => {
                let status = required(Some(&status), "status")?;
                order.status = status.to_string();
                if let Some(link) = non_blank(completed_link.as_deref()) {
                    order.completed_link = Some(link.to_string());
                }
                if let Some(link) = non_blank(completed_link2.as_deref()) {
                    order.completed_link2 = Some(link.to_string());
                }
            }
            OrderPatch::UploadDraft { draft_text } => {
                order.draft_text = Some(required(Some(&draft_text), "draftText")?.to_string());
            }
            OrderPatch::ReviseDraft {
                draft_text,
                revision_text,
            } => {
                order.draft_text = Some(required(Some(&draft_text), "draftText")?.to_string());
                if let Some(text) = non_blank(revision_text.as_deref()) {
                    order.revision_text = Some(text.to_string());
                }
            }
            OrderPatch::Publish {
                completed_link,
                completed_link2,
                reviewer_name,
            } => {
                let link = required(Some(&completed_link), "completedLink")?;
                order.completed_link = Some(link.to_string());
                order.completed_link2 = non_blank(completed_link2.as_deref()).map(str::to_string);
                if let Some(name) = non_blank(reviewer_name.as_deref()) {
                    order.reviewer_name = Some(name.to_string());
                }
            }
            OrderPatch::RequestRevision { revision_request } => {
                let text = required(Some(&revision_request), "revisionRequest")?;
                order.revision_request = Some(text.to_string());
            }
            OrderPatch::Approve => {}
            OrderPatch::EditDraft { revision_text } => {
                let text = required(Some(&revision_text), "revisionText")?;
                order.revision_text = Some(text.to_string());
            }
        }

        if let Some(next) = next {
            order.status = next.as_str().to_string();
        }
        order.updated_at = now;

        Ok(PatchOutcome {
            from,
            to: order.status.clone(),
            audit,
        })
    }
}

fn required<'a>(value: Option<&'a String>, field: &'static str) -> AppResult<&'a str> {
    non_blank(value.map(String::as_str)).ok_or_else(|| {
        AppError::validation(format!("{field} 값을 입력해주세요")).with_detail("field", field)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOrder;
    use crate::order::TaskType;

    const CLIENT: i64 = 10;
    const ADMIN: i64 = 1;

    fn order(task_type: TaskType, status: &str) -> Order {
        let mut o = Order::from_new(100, CLIENT, NewOrder::pending(task_type), 0);
        o.status = status.to_string();
        o
    }

    fn parse(json: serde_json::Value) -> OrderPatch {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_deserialize_tagged_body() {
        let patch = parse(serde_json::json!({
            "action": "publish",
            "completedLink": "https://blog.example/1"
        }));
        assert_eq!(
            patch,
            OrderPatch::Publish {
                completed_link: "https://blog.example/1".into(),
                completed_link2: None,
                reviewer_name: None
            }
        );
        assert_eq!(parse(serde_json::json!({"action": "approve"})), OrderPatch::Approve);
    }

    #[test]
    fn test_admin_sets_any_generic_status() {
        let mut o = order(TaskType::Follower, "pending");
        let outcome = OrderPatch::SetStatus {
            status: "done".into(),
            completed_link: Some("https://insta.example/p/1".into()),
            completed_link2: None,
        }
        .apply(&mut o, ADMIN, Role::Admin, 5)
        .unwrap();

        assert_eq!(o.status, "done");
        assert_eq!(o.completed_link.as_deref(), Some("https://insta.example/p/1"));
        assert_eq!(o.updated_at, 5);
        assert_eq!(outcome.from, "pending");
        assert_eq!(outcome.audit, Some(AdminAction::OrderStatusUpdate));

        // Back to pending is allowed too
        OrderPatch::SetStatus {
            status: "pending".into(),
            completed_link: None,
            completed_link2: None,
        }
        .apply(&mut o, ADMIN, Role::Superadmin, 6)
        .unwrap();
        assert_eq!(o.status, "pending");
    }

    #[test]
    fn test_set_status_rejected_on_review_order() {
        let mut o = order(TaskType::BlogReview, "pending");
        let err = OrderPatch::SetStatus {
            status: "published".into(),
            completed_link: None,
            completed_link2: None,
        }
        .apply(&mut o, ADMIN, Role::Admin, 1)
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert_eq!(o.status, "pending");
    }

    #[test]
    fn test_client_cannot_drive_staff_steps() {
        let mut o = order(TaskType::BlogReview, "pending");
        let err = OrderPatch::UploadDraft {
            draft_text: "초안".into(),
        }
        .apply(&mut o, CLIENT, Role::Client, 1)
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
    }

    #[test]
    fn test_only_owner_can_approve() {
        let mut o = order(TaskType::BlogReview, "draft_uploaded");
        let err = OrderPatch::Approve
            .apply(&mut o, CLIENT + 1, Role::Client, 1)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = OrderPatch::Approve.apply(&mut o, ADMIN, Role::Admin, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(o.status, "draft_uploaded");
    }

    #[test]
    fn test_blank_revision_request_is_validation_error() {
        let mut o = order(TaskType::BlogReview, "draft_uploaded");
        let err = OrderPatch::RequestRevision {
            revision_request: "   ".into(),
        }
        .apply(&mut o, CLIENT, Role::Client, 1)
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(o.status, "draft_uploaded");
        assert!(o.revision_request.is_none());
    }

    #[test]
    fn test_full_review_workflow() {
        let mut o = order(TaskType::ReceiptReview, "pending");

        let out = OrderPatch::UploadDraft {
            draft_text: "초안입니다".into(),
        }
        .apply(&mut o, ADMIN, Role::Admin, 1)
        .unwrap();
        assert_eq!(out.to, "draft_uploaded");
        assert_eq!(out.audit, Some(AdminAction::OrderDraftUpload));

        let out = OrderPatch::RequestRevision {
            revision_request: "메뉴 이름을 넣어주세요".into(),
        }
        .apply(&mut o, CLIENT, Role::Client, 2)
        .unwrap();
        assert_eq!(out.to, "revision_requested");
        assert_eq!(out.audit, None);

        OrderPatch::ReviseDraft {
            draft_text: "수정본".into(),
            revision_text: Some("메뉴 이름 반영".into()),
        }
        .apply(&mut o, ADMIN, Role::Admin, 3)
        .unwrap();
        assert_eq!(o.status, "draft_revised");
        assert_eq!(o.draft_text.as_deref(), Some("수정본"));

        OrderPatch::EditDraft {
            revision_text: "제가 직접 고쳤어요".into(),
        }
        .apply(&mut o, CLIENT, Role::Client, 4)
        .unwrap();
        assert_eq!(o.status, "client_approved");
        assert_eq!(o.revision_text.as_deref(), Some("제가 직접 고쳤어요"));

        let out = OrderPatch::Publish {
            completed_link: "https://blog.example/post/9".into(),
            completed_link2: None,
            reviewer_name: Some("리뷰어".into()),
        }
        .apply(&mut o, ADMIN, Role::Admin, 5)
        .unwrap();
        assert_eq!(out.from, "client_approved");
        assert_eq!(out.to, "published");
        assert_eq!(out.audit, Some(AdminAction::OrderPublish));
        assert_eq!(o.reviewer_name.as_deref(), Some("리뷰어"));
    }

    #[test]
    fn test_publish_requires_client_approval() {
        let mut o = order(TaskType::BlogReview, "draft_uploaded");
        let err = OrderPatch::Publish {
            completed_link: "https://blog.example/1".into(),
            completed_link2: None,
            reviewer_name: None,
        }
        .apply(&mut o, ADMIN, Role::Admin, 1)
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
        assert!(o.completed_link.is_none());
    }

    #[test]
    fn test_review_action_on_generic_order() {
        let mut o = order(TaskType::Like, "pending");
        let err = OrderPatch::UploadDraft {
            draft_text: "x".into(),
        }
        .apply(&mut o, ADMIN, Role::Admin, 1)
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);
    }
}
