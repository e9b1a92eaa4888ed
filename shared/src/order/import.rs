//! Link-only import
//!
//! Staff register reviews that were already published elsewhere. Each row
//! becomes a `published` order with `is_link_only = true` and still debits one
//! quota unit. Rows are grouped by `(clientId, category)`; a group reserves all
//! of its units at once and either every row in it succeeds or every row fails.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::status::ReviewStatus;
use super::task::TaskType;
use crate::error::{AppError, AppResult};
use crate::models::{NewOrder, QuotaCategory};
use crate::util::non_blank;

/// One spreadsheet row (or the single-import body)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkImportRow {
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub completed_link: Option<String>,
    #[serde(default)]
    pub completed_link2: Option<String>,
    #[serde(default)]
    pub reviewer_name: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl LinkImportRow {
    /// Validate into `(clientId, payload)`
    pub fn validate(self) -> AppResult<(i64, NewOrder)> {
        let client_id = self
            .client_id
            .ok_or_else(|| AppError::validation("클라이언트를 선택해주세요").with_detail("field", "clientId"))?;
        let task_type: TaskType = non_blank(self.task_type.as_deref())
            .unwrap_or("blog_review")
            .parse()?;
        if !task_type.is_review() {
            return Err(AppError::validation("블로그/영수증 리뷰만 등록할 수 있습니다")
                .with_detail("taskType", task_type.as_str()));
        }
        let link = non_blank(self.completed_link.as_deref()).ok_or_else(|| {
            AppError::validation("완료 링크를 입력해주세요").with_detail("field", "completedLink")
        })?;

        let mut new = NewOrder::pending(task_type);
        new.status = ReviewStatus::Published.as_str().to_string();
        new.is_link_only = true;
        new.completed_link = Some(link.to_string());
        new.completed_link2 = non_blank(self.completed_link2.as_deref()).map(str::to_string);
        new.reviewer_name = non_blank(self.reviewer_name.as_deref()).map(str::to_string);
        new.caption = non_blank(self.caption.as_deref()).map(str::to_string);
        Ok((client_id, new))
    }
}

/// `POST /orders/blog-receipt/bulk` body
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkImportRequest {
    pub rows: Vec<LinkImportRow>,
}

/// Per-row outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkImportResult {
    /// 1-based row number in the submitted sheet
    pub row: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LinkImportResult {
    pub fn ok(row: usize, order_id: i64) -> Self {
        Self {
            row,
            success: true,
            order_id: Some(order_id),
            error: None,
        }
    }

    pub fn failed(row: usize, error: impl Into<String>) -> Self {
        Self {
            row,
            success: false,
            order_id: None,
            error: Some(error.into()),
        }
    }
}

/// Bulk import summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportResponse {
    pub created: usize,
    pub failed: usize,
    pub results: Vec<LinkImportResult>,
}

impl BulkImportResponse {
    pub fn new(mut results: Vec<LinkImportResult>) -> Self {
        results.sort_by_key(|r| r.row);
        let created = results.iter().filter(|r| r.success).count();
        Self {
            created,
            failed: results.len() - created,
            results,
        }
    }
}

/// Rows sharing one client and quota category
#[derive(Debug, Clone, PartialEq)]
pub struct ImportGroup {
    pub client_id: i64,
    pub category: QuotaCategory,
    /// `(row number, payload)`
    pub rows: Vec<(usize, NewOrder)>,
}

impl ImportGroup {
    pub fn count(&self) -> i64 {
        self.rows.len() as i64
    }

    /// Fail every row of the group with the same message
    pub fn fail_all(&self, error: &str) -> Vec<LinkImportResult> {
        self.rows
            .iter()
            .map(|(row, _)| LinkImportResult::failed(*row, error))
            .collect()
    }
}

/// Validated and grouped import
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportPlan {
    pub groups: Vec<ImportGroup>,
    /// Rows that failed validation and never reach the ledger
    pub rejected: Vec<LinkImportResult>,
}

impl ImportPlan {
    pub fn build(rows: Vec<LinkImportRow>) -> Self {
        let mut groups: BTreeMap<(i64, QuotaCategory), Vec<(usize, NewOrder)>> = BTreeMap::new();
        let mut rejected = Vec::new();

        for (idx, row) in rows.into_iter().enumerate() {
            let row_no = idx + 1;
            match row.validate() {
                Ok((client_id, new)) => {
                    let category = new.task_type.quota_category();
                    groups
                        .entry((client_id, category))
                        .or_default()
                        .push((row_no, new));
                }
                Err(err) => rejected.push(LinkImportResult::failed(row_no, err.message)),
            }
        }

        let groups = groups
            .into_iter()
            .map(|((client_id, category), rows)| ImportGroup {
                client_id,
                category,
                rows,
            })
            .collect();
        Self { groups, rejected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(client_id: i64, task_type: &str, link: &str) -> LinkImportRow {
        LinkImportRow {
            client_id: Some(client_id),
            task_type: Some(task_type.into()),
            completed_link: Some(link.into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_row_becomes_published_link_only_order() {
        let (client_id, new) = row(5, "receipt_review", "https://m.place.example/1")
            .validate()
            .unwrap();
        assert_eq!(client_id, 5);
        assert_eq!(new.status, "published");
        assert!(new.is_link_only);
        assert_eq!(new.completed_link.as_deref(), Some("https://m.place.example/1"));
    }

    #[test]
    fn test_task_type_defaults_to_blog_review() {
        let mut r = row(5, "", "https://blog.example/1");
        r.task_type = None;
        let (_, new) = r.validate().unwrap();
        assert_eq!(new.task_type, TaskType::BlogReview);
    }

    #[test]
    fn test_plan_groups_by_client_and_category() {
        let plan = ImportPlan::build(vec![
            row(1, "blog_review", "https://b/1"),
            row(2, "blog_review", "https://b/2"),
            row(1, "receipt_review", "https://r/3"),
            row(1, "blog_review", "https://b/4"),
            row(1, "like", "https://x/5"),
            row(1, "blog_review", " "),
        ]);

        assert_eq!(plan.groups.len(), 3);
        let blog_1 = plan
            .groups
            .iter()
            .find(|g| g.client_id == 1 && g.category == QuotaCategory::Blog)
            .unwrap();
        let rows: Vec<usize> = blog_1.rows.iter().map(|(r, _)| *r).collect();
        assert_eq!(rows, vec![1, 4]);
        assert_eq!(blog_1.count(), 2);

        let rejected: Vec<usize> = plan.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rejected, vec![5, 6]);
        assert!(plan.rejected.iter().all(|r| !r.success));
    }

    #[test]
    fn test_response_counts_and_orders_rows() {
        let response = BulkImportResponse::new(vec![
            LinkImportResult::failed(3, "x"),
            LinkImportResult::ok(1, 100),
            LinkImportResult::ok(2, 101),
        ]);
        assert_eq!(response.created, 2);
        assert_eq!(response.failed, 1);
        assert_eq!(response.results[0].row, 1);

        let json = serde_json::to_value(&response.results[2]).unwrap();
        assert_eq!(json["success"], false);
        assert!(json.get("orderId").is_none());
    }
}
