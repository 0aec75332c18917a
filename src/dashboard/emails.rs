//! Paginated inbox listing and the selected-email detail.

use crate::api::{ApiError, ApiResult, EmailPage};
use crate::domain::email::{EmailDetail, EmailId, EmailRecord, EmailSummary, group_by_quadrant};

pub const PAGE_SIZE: u32 = 20;

/// How an async completion was handled by its controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Applied,
    Failed(ApiError),
    /// The result no longer matches what the user asked for last.
    Stale,
}

/// Which kind of mail the list shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Primary,
    Promotions,
}

impl KindFilter {
    pub fn next(self) -> Self {
        match self {
            KindFilter::All => KindFilter::Primary,
            KindFilter::Primary => KindFilter::Promotions,
            KindFilter::Promotions => KindFilter::All,
        }
    }

    pub fn accepts(self, email: &EmailSummary) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Primary => !email.is_promotion,
            KindFilter::Promotions => email.is_promotion,
        }
    }
}

#[derive(Debug)]
pub struct EmailList {
    page: u32,
    page_size: u32,
    total: u64,
    items: Vec<EmailSummary>,
    /// Page of the most recent fetch still in flight.
    requested: Option<u32>,
    query: String,
    kind: KindFilter,
    /// Order the page by urgency/importance quadrant.
    grouped: bool,
}

impl Default for EmailList {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

impl EmailList {
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.max(1),
            total: 0,
            items: vec![],
            requested: None,
            query: String::new(),
            kind: KindFilter::All,
            grouped: false,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn items(&self) -> &[EmailSummary] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.requested.is_some()
    }

    /// `ceil(total / page_size)`, never less than one.
    pub fn total_pages(&self) -> u32 {
        let pages = self.total.div_ceil(self.page_size as u64);
        pages.clamp(1, u32::MAX as u64) as u32
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Ask for `page`. Pages outside `[1, total_pages]` are ignored.
    pub fn request_page(&mut self, page: u32) -> Option<u32> {
        if page < 1 || page > self.total_pages() {
            return None;
        }
        self.requested = Some(page);
        Some(page)
    }

    pub fn refresh(&mut self) -> u32 {
        self.requested = Some(1);
        1
    }

    pub fn next(&mut self) -> Option<u32> {
        self.request_page(self.page + 1)
    }

    pub fn prev(&mut self) -> Option<u32> {
        self.request_page(self.page.saturating_sub(1))
    }

    /// Replace the held page on success; keep it untouched on failure.
    pub fn apply_page(&mut self, page: u32, result: ApiResult<EmailPage>) -> Outcome {
        if self.requested != Some(page) {
            log::debug!("discarding stale page {page} (want {:?})", self.requested);
            return Outcome::Stale;
        }
        self.requested = None;
        match result {
            Ok(data) => {
                self.page = page;
                self.items = data.items;
                self.total = data.total;
                Outcome::Applied
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Held items whose sender or subject contains `query`, ignoring case.
    /// Only the current page is searched.
    pub fn filter(&self, query: &str) -> Vec<&EmailSummary> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.items.iter().collect();
        }
        self.items.iter().filter(|e| e.matches(&needle)).collect()
    }

    pub fn kind(&self) -> KindFilter {
        self.kind
    }

    pub fn set_kind(&mut self, kind: KindFilter) {
        self.kind = kind;
    }

    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub fn set_grouped(&mut self, grouped: bool) {
        self.grouped = grouped;
    }

    /// Items after the stored search query and kind filter, in quadrant
    /// order when grouped.
    pub fn visible(&self) -> Vec<&EmailSummary> {
        let mut items = self.filter(&self.query);
        items.retain(|e| self.kind.accepts(e));
        if !self.grouped {
            return items;
        }
        group_by_quadrant(items)
            .into_iter()
            .flat_map(|(_, group)| group)
            .collect()
    }

    /// View preferences survive a logout.
    pub fn clear(&mut self) {
        let (kind, grouped) = (self.kind, self.grouped);
        *self = Self::new(self.page_size);
        self.kind = kind;
        self.grouped = grouped;
    }
}

/// Detail pane for the selected email. The last selection always wins.
#[derive(Debug, Default)]
pub struct DetailLoader {
    current: Option<EmailDetail>,
}

impl DetailLoader {
    /// Show the summary immediately and return the id to fetch.
    pub fn select(&mut self, summary: EmailSummary) -> EmailId {
        let id = summary.id;
        self.current = Some(EmailDetail::pending(summary));
        id
    }

    pub fn apply(&mut self, id: EmailId, result: ApiResult<EmailRecord>) -> Outcome {
        let Some(current) = self.current.as_mut() else {
            return Outcome::Stale;
        };
        if current.id() != id {
            log::debug!("discarding detail for {id}, {} is selected", current.id());
            return Outcome::Stale;
        }
        match result {
            Ok(record) => {
                *current = EmailDetail::loaded(record);
                Outcome::Applied
            }
            Err(e) => {
                current.loading = false;
                current.error = Some(e.to_string());
                Outcome::Failed(e)
            }
        }
    }

    pub fn current(&self) -> Option<&EmailDetail> {
        self.current.as_ref()
    }

    pub fn selected_id(&self) -> Option<EmailId> {
        self.current.as_ref().map(|d| d.id())
    }

    /// Thread of the open email, for contextualising AI questions.
    pub fn thread_id(&self) -> Option<String> {
        self.current.as_ref().and_then(|d| d.thread_id.clone())
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: EmailId, sender: &str, subject: &str) -> EmailSummary {
        EmailSummary {
            id,
            sender: sender.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    fn page_of(items: Vec<EmailSummary>, total: u64) -> ApiResult<EmailPage> {
        Ok(EmailPage { items, total })
    }

    fn loaded_list(total: u64) -> EmailList {
        let mut list = EmailList::default();
        let p = list.refresh();
        list.apply_page(
            p,
            page_of(
                vec![
                    summary(1, "Alice <alice@corp.io>", "Quarterly report"),
                    summary(2, "bob@shop.com", "Your ORDER shipped"),
                    summary(3, "carol@corp.io", "Lunch?"),
                ],
                total,
            ),
        );
        list
    }

    #[test]
    fn single_item_means_single_page() {
        let mut list = EmailList::default();
        list.refresh();
        assert_eq!(
            list.apply_page(1, page_of(vec![summary(5, "a", "b")], 1)),
            Outcome::Applied
        );
        assert_eq!(list.total_pages(), 1);
        assert!(!list.has_next());
        assert!(!list.has_prev());
        assert_eq!(list.next(), None);
    }

    #[test]
    fn navigation_is_clamped() {
        let mut list = loaded_list(45);
        assert_eq!(list.total_pages(), 3);
        assert_eq!(list.prev(), None);
        assert_eq!(list.request_page(0), None);
        assert_eq!(list.request_page(4), None);
        assert_eq!(list.request_page(3), Some(3));
        assert_eq!(list.next(), Some(2));
    }

    #[test]
    fn failed_fetch_keeps_previous_page() {
        let mut list = loaded_list(45);
        let p = list.next().unwrap();
        let err = ApiError::Status {
            status: 500,
            detail: "down".into(),
        };
        assert_eq!(list.apply_page(p, Err(err.clone())), Outcome::Failed(err));
        assert_eq!(list.page(), 1);
        assert_eq!(list.items().len(), 3);
        assert!(!list.is_loading());
    }

    #[test]
    fn stale_page_result_is_discarded() {
        let mut list = loaded_list(100);
        list.request_page(2);
        list.request_page(3);

        let late = page_of(vec![summary(20, "x", "page two")], 100);
        assert_eq!(list.apply_page(2, late), Outcome::Stale);
        assert_eq!(list.page(), 1);

        let fresh = page_of(vec![summary(40, "y", "page three")], 100);
        assert_eq!(list.apply_page(3, fresh), Outcome::Applied);
        assert_eq!(list.page(), 3);
        assert_eq!(list.items()[0].id, 40);
    }

    #[test]
    fn refetching_the_same_page_is_idempotent() {
        let mut list = loaded_list(45);
        let first: Vec<EmailSummary> = list.items().to_vec();
        let p = list.refresh();
        list.apply_page(p, page_of(first.clone(), 45));
        assert_eq!(list.items(), first.as_slice());
        assert_eq!(list.page(), 1);
    }

    #[test]
    fn filter_matches_sender_or_subject_case_insensitively() {
        let list = loaded_list(3);
        let ids = |v: Vec<&EmailSummary>| v.iter().map(|e| e.id).collect::<Vec<_>>();

        assert_eq!(ids(list.filter("")), vec![1, 2, 3]);
        assert_eq!(ids(list.filter("CORP.io")), vec![1, 3]);
        assert_eq!(ids(list.filter("order")), vec![2]);
        assert!(list.filter("nothing").is_empty());
        // filtering never touches the held page or its counts
        assert_eq!(ids(list.filter("   ")), vec![1, 2, 3]);
        assert_eq!(list.total(), 3);
    }

    #[test]
    fn stored_query_drives_visible_items() {
        let mut list = loaded_list(3);
        list.set_query("lunch");
        assert_eq!(list.visible().len(), 1);
        list.set_query("");
        assert_eq!(list.visible().len(), 3);
    }

    #[test]
    fn kind_filter_and_grouping_shape_visible_items() {
        let mut list = EmailList::default();
        let p = list.refresh();
        let email = |id, quadrant: Option<&str>, is_promotion| EmailSummary {
            id,
            quadrant: quadrant.map(String::from),
            is_promotion,
            ..Default::default()
        };
        list.apply_page(
            p,
            page_of(
                vec![
                    email(1, Some("not_urgent_not_important"), true),
                    email(2, Some("urgent_important"), false),
                    email(3, None, false),
                    email(4, Some("not_urgent_important"), true),
                ],
                4,
            ),
        );
        let ids = |list: &EmailList| list.visible().iter().map(|e| e.id).collect::<Vec<_>>();

        assert_eq!(ids(&list), vec![1, 2, 3, 4]);
        list.set_grouped(true);
        assert_eq!(ids(&list), vec![2, 4, 1, 3]);

        list.set_kind(KindFilter::Promotions);
        assert_eq!(ids(&list), vec![4, 1]);
        list.set_kind(list.kind().next());
        assert_eq!(list.kind(), KindFilter::All);

        list.set_kind(KindFilter::Primary);
        list.clear();
        assert!(list.is_grouped());
        assert_eq!(list.kind(), KindFilter::Primary);
    }

    #[test]
    fn last_selection_wins() {
        let mut detail = DetailLoader::default();
        let a = detail.select(summary(1, "a", "A"));
        let b = detail.select(summary(2, "b", "B"));

        let late_a = EmailRecord {
            summary: summary(a, "a", "A"),
            body_text: Some("body of A".into()),
            ..Default::default()
        };
        assert_eq!(detail.apply(a, Ok(late_a)), Outcome::Stale);
        let shown = detail.current().unwrap();
        assert_eq!(shown.id(), b);
        assert!(shown.loading);

        let rec_b = EmailRecord {
            summary: summary(b, "b", "B"),
            body_text: Some("body of B".into()),
            thread_id: Some("t-b".into()),
            ..Default::default()
        };
        assert_eq!(detail.apply(b, Ok(rec_b)), Outcome::Applied);
        assert_eq!(detail.current().unwrap().body(), "body of B");
        assert_eq!(detail.thread_id().as_deref(), Some("t-b"));
    }

    #[test]
    fn failed_detail_stops_loading_without_foreign_content() {
        let mut detail = DetailLoader::default();
        let id = detail.select(summary(7, "a", "A"));
        let out = detail.apply(id, Err(ApiError::Transport("reset".into())));
        assert!(matches!(out, Outcome::Failed(_)));
        let shown = detail.current().unwrap();
        assert!(!shown.loading);
        assert_eq!(shown.id(), 7);
        assert!(shown.error.is_some());
        assert_eq!(shown.body_text, None);
    }
}
