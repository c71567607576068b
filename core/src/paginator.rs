use std::mem;

use tracing::{debug, warn};

use crate::filter::Filter;
use crate::models::SportEvent;
use crate::query::{translate, QueryOptions, SearchRequest};
use crate::remote::{RemoteError, SearchService};

pub const FIRST_PAGE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Idle {
        page_key: u32,
    },
    LoadingFirstPage {
        page_key: u32,
    },
    LoadingNextPage {
        accumulated: Vec<SportEvent>,
        page_key: u32,
    },
    Ready {
        accumulated: Vec<SportEvent>,
        page_key: u32,
        is_last_page: bool,
    },
    /// Pages loaded before the failure are kept
    Error {
        accumulated: Vec<SportEvent>,
        failed_page_key: u32,
        error: RemoteError,
    },
}

impl Default for PageState {
    fn default() -> Self {
        PageState::Idle {
            page_key: FIRST_PAGE,
        }
    }
}

/// An issued page request, handed back to [`Paginator::complete`] with its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTicket {
    generation: u64,
    page_key: u32,
    request: SearchRequest,
}

impl PageTicket {
    pub fn page_key(&self) -> u32 {
        self.page_key
    }

    pub fn request(&self) -> &SearchRequest {
        &self.request
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Loaded { received: usize, is_last_page: bool },
    Failed(RemoteError),
    /// The result belonged to a superseded query and was dropped
    StaleIgnored,
    /// Nothing was requested: a request is in flight, the page is loaded, or there are no more pages
    Skipped,
}

/// Page-by-page retrieval of search results for one filter set.
///
/// Requests are split into `begin_*` (state transition plus the request to
/// send) and [`complete`](Paginator::complete), so a caller may run the remote
/// call wherever it likes. Only one request is in flight at a time.
pub struct Paginator<S> {
    service: S,
    options: QueryOptions,
    state: PageState,
    generation: u64,
}

impl<S: SearchService> Paginator<S> {
    pub fn new(service: S, options: QueryOptions) -> Self {
        Paginator {
            service,
            options,
            state: PageState::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Everything accumulated so far, including pages kept across an error
    pub fn items(&self) -> &[SportEvent] {
        match &self.state {
            PageState::LoadingNextPage { accumulated, .. }
            | PageState::Ready { accumulated, .. }
            | PageState::Error { accumulated, .. } => accumulated,
            PageState::Idle { .. } | PageState::LoadingFirstPage { .. } => &[],
        }
    }

    pub fn is_last_page(&self) -> bool {
        matches!(
            self.state,
            PageState::Ready {
                is_last_page: true,
                ..
            }
        )
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.state,
            PageState::LoadingFirstPage { .. } | PageState::LoadingNextPage { .. }
        )
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match &self.state {
            PageState::Error { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Drop everything and load `page_key` as a fresh first page.
    /// Supersedes any request still in flight.
    pub fn begin_first_page(&mut self, filters: &[Filter], page_key: u32) -> PageTicket {
        self.generation = self.generation.wrapping_add(1);
        self.state = PageState::LoadingFirstPage { page_key };
        self.ticket(filters, page_key)
    }

    /// Next page after `Ready`, or the failed page again after `Error`
    pub fn begin_next_page(&mut self, filters: &[Filter]) -> Option<PageTicket> {
        match mem::take(&mut self.state) {
            PageState::Ready {
                accumulated,
                page_key,
                is_last_page: false,
            } => match page_key.checked_add(1) {
                Some(next) => {
                    self.state = PageState::LoadingNextPage {
                        accumulated,
                        page_key: next,
                    };
                    Some(self.ticket(filters, next))
                }
                None => {
                    warn!(page = page_key, "No page key after the last loaded page");
                    self.state = PageState::Ready {
                        accumulated,
                        page_key,
                        is_last_page: false,
                    };
                    None
                }
            },
            PageState::Error {
                accumulated,
                failed_page_key,
                ..
            } => {
                if accumulated.is_empty() {
                    return Some(self.begin_first_page(filters, failed_page_key));
                }
                self.state = PageState::LoadingNextPage {
                    accumulated,
                    page_key: failed_page_key,
                };
                Some(self.ticket(filters, failed_page_key))
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Ask for `page_key` specifically. A key that is already loaded is a no-op.
    pub fn request_page(&mut self, filters: &[Filter], page_key: u32) -> Option<PageTicket> {
        match self.state {
            PageState::Ready {
                page_key: loaded, ..
            } if loaded.checked_add(1) == Some(page_key) => self.begin_next_page(filters),
            PageState::Error {
                failed_page_key, ..
            } if page_key == failed_page_key => self.begin_next_page(filters),
            _ => None,
        }
    }

    /// Apply the result of `ticket`.
    ///
    /// `current_filters` is the filter set as it is now. A result whose query
    /// no longer matches it, or that a later `begin_first_page` superseded,
    /// is dropped without touching the state. A dropped result leaves the
    /// paginator loading, so every further page request is skipped until
    /// `refresh` (or `begin_first_page`) starts over for the new filters.
    pub fn complete(
        &mut self,
        ticket: PageTicket,
        current_filters: &[Filter],
        result: Result<Vec<SportEvent>, RemoteError>,
    ) -> PageOutcome {
        if ticket.generation != self.generation {
            warn!(page = ticket.page_key, "Dropping page from a superseded request");
            return PageOutcome::StaleIgnored;
        }
        if translate(current_filters, ticket.page_key, &self.options) != ticket.request {
            warn!(page = ticket.page_key, "Dropping page for a changed filter set");
            return PageOutcome::StaleIgnored;
        }

        let accumulated = match mem::take(&mut self.state) {
            PageState::LoadingFirstPage { page_key } if page_key == ticket.page_key => vec![],
            PageState::LoadingNextPage {
                accumulated,
                page_key,
            } if page_key == ticket.page_key => accumulated,
            other => {
                self.state = other;
                warn!(page = ticket.page_key, "Dropping page that is not awaited");
                return PageOutcome::StaleIgnored;
            }
        };

        match result {
            Ok(events) => {
                let received = events.len();
                let is_last_page = received < self.options.page_size as usize;
                let mut accumulated = accumulated;
                accumulated.extend(events);

                debug!(
                    page = ticket.page_key,
                    received,
                    total = accumulated.len(),
                    is_last_page,
                    "Page loaded"
                );
                self.state = PageState::Ready {
                    accumulated,
                    page_key: ticket.page_key,
                    is_last_page,
                };
                PageOutcome::Loaded {
                    received,
                    is_last_page,
                }
            }
            Err(error) => {
                warn!(page = ticket.page_key, %error, "Page request failed");
                self.state = PageState::Error {
                    accumulated,
                    failed_page_key: ticket.page_key,
                    error: error.clone(),
                };
                PageOutcome::Failed(error)
            }
        }
    }

    /// Load `page_key` as the first page
    pub async fn start(&mut self, filters: &[Filter], page_key: u32) -> PageOutcome {
        let ticket = self.begin_first_page(filters, page_key);
        self.fetch(ticket, filters).await
    }

    /// Discard accumulated results and start over, used whenever the filter set changes
    pub async fn refresh(&mut self, filters: &[Filter], page_key: u32) -> PageOutcome {
        debug!(discarded = self.items().len(), "Refreshing results");
        self.start(filters, page_key).await
    }

    pub async fn request_next_page(&mut self, filters: &[Filter]) -> PageOutcome {
        match self.begin_next_page(filters) {
            Some(ticket) => self.fetch(ticket, filters).await,
            None => PageOutcome::Skipped,
        }
    }

    async fn fetch(&mut self, ticket: PageTicket, filters: &[Filter]) -> PageOutcome {
        debug!(page = ticket.page_key, "Requesting page");
        let result = self.service.search(&ticket.request).await;
        self.complete(ticket, filters, result)
    }

    fn ticket(&self, filters: &[Filter], page_key: u32) -> PageTicket {
        PageTicket {
            generation: self.generation,
            page_key,
            request: translate(filters, page_key, &self.options),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::filter::FilterKind;
    use crate::remote::RemoteErrorKind;

    type PageResult = Result<Vec<SportEvent>, RemoteError>;

    /// Answers each page from a script and records which pages were asked for
    #[derive(Default)]
    struct FakeSearch {
        pages: Mutex<HashMap<u32, PageResult>>,
        calls: Mutex<Vec<u32>>,
    }

    impl FakeSearch {
        fn with_page(self, page: u32, result: PageResult) -> Self {
            self.pages.lock().unwrap().insert(page, result);
            self
        }
    }

    #[async_trait]
    impl SearchService for FakeSearch {
        async fn search(&self, request: &SearchRequest) -> Result<Vec<SportEvent>, RemoteError> {
            self.calls.lock().unwrap().push(request.page);
            self.pages
                .lock()
                .unwrap()
                .get(&request.page)
                .cloned()
                .unwrap_or_else(|| Ok(vec![]))
        }
    }

    fn events(first_id: i64, count: usize) -> Vec<SportEvent> {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        (first_id..first_id + count as i64)
            .map(|id| SportEvent {
                id,
                sport_name: "Футбол".to_string(),
                event_name: format!("Событие {}", id),
                date_from: day,
                date_to: day,
                description: None,
                location: "Брянск".to_string(),
                member_count: 20,
                team_name: None,
                programs: vec![],
                disciplines: vec![],
                performer: None,
                ekp: id.to_string(),
            })
            .collect()
    }

    fn server_error() -> RemoteError {
        RemoteError::from_status(500)
    }

    fn football() -> Vec<Filter> {
        vec![Filter::reference(FilterKind::SportCategory, 3, "Футбол").unwrap()]
    }

    #[tokio::test]
    async fn test_short_page_ends_pagination() {
        let service = FakeSearch::default()
            .with_page(1, Ok(events(1, 10)))
            .with_page(2, Ok(events(11, 4)));
        let mut paginator = Paginator::new(&service, QueryOptions::default());
        let filters = football();

        let first = paginator.start(&filters, FIRST_PAGE).await;
        assert_eq!(
            first,
            PageOutcome::Loaded {
                received: 10,
                is_last_page: false
            }
        );

        paginator.request_next_page(&filters).await;

        assert!(paginator.is_last_page());
        assert_eq!(paginator.items().len(), 14);
        assert_eq!(
            paginator.request_next_page(&filters).await,
            PageOutcome::Skipped
        );
        assert_eq!(*service.calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_later_page_failure_keeps_loaded_pages() {
        let service = FakeSearch::default()
            .with_page(1, Ok(events(1, 10)))
            .with_page(2, Err(server_error()));
        let mut paginator = Paginator::new(&service, QueryOptions::default());
        let filters = football();

        paginator.start(&filters, FIRST_PAGE).await;
        let outcome = paginator.request_next_page(&filters).await;

        assert_eq!(outcome, PageOutcome::Failed(server_error()));
        assert_eq!(paginator.items().len(), 10);
        match paginator.state() {
            PageState::Error {
                failed_page_key, ..
            } => assert_eq!(*failed_page_key, 2),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_requests_the_failed_page() {
        let service = FakeSearch::default()
            .with_page(1, Ok(events(1, 10)))
            .with_page(2, Err(server_error()));
        let mut paginator = Paginator::new(&service, QueryOptions::default());
        let filters = football();

        paginator.start(&filters, FIRST_PAGE).await;
        paginator.request_next_page(&filters).await;

        service
            .pages
            .lock()
            .unwrap()
            .insert(2, Ok(events(11, 3)));
        paginator.request_next_page(&filters).await;

        assert_eq!(paginator.items().len(), 13);
        assert!(paginator.is_last_page());
        assert_eq!(*service.calls.lock().unwrap(), vec![1, 2, 2]);
    }

    #[tokio::test]
    async fn test_first_page_failure_has_nothing_accumulated() {
        let service = FakeSearch::default().with_page(
            1,
            Err(RemoteError::unreachable("connection lost")),
        );
        let mut paginator = Paginator::new(&service, QueryOptions::default());

        paginator.start(&[], FIRST_PAGE).await;

        assert!(paginator.items().is_empty());
        assert_eq!(
            paginator.error().map(|e| e.kind),
            Some(RemoteErrorKind::Unreachable)
        );

        // Retrying a failed first page goes through the first-page path again
        let ticket = paginator.begin_next_page(&[]).unwrap();
        assert_eq!(ticket.page_key(), FIRST_PAGE);
        assert_eq!(
            paginator.state(),
            &PageState::LoadingFirstPage { page_key: 1 }
        );
    }

    #[tokio::test]
    async fn test_refresh_discards_accumulated_results() {
        let service = FakeSearch::default()
            .with_page(1, Ok(events(1, 10)))
            .with_page(2, Ok(events(11, 10)));
        let mut paginator = Paginator::new(&service, QueryOptions::default());
        let filters = football();

        paginator.start(&filters, FIRST_PAGE).await;
        paginator.request_next_page(&filters).await;
        assert_eq!(paginator.items().len(), 20);

        paginator.refresh(&filters, FIRST_PAGE).await;

        assert_eq!(paginator.items().len(), 10);
        assert_eq!(paginator.items()[0].id, 1);
    }

    #[test]
    fn test_single_flight() {
        let service = FakeSearch::default();
        let mut paginator = Paginator::new(&service, QueryOptions::default());

        let _ticket = paginator.begin_first_page(&[], FIRST_PAGE);

        assert!(paginator.is_loading());
        assert!(paginator.begin_next_page(&[]).is_none());
        assert!(paginator.request_page(&[], 2).is_none());
    }

    #[test]
    fn test_loaded_page_is_not_requested_again() {
        let service = FakeSearch::default();
        let mut paginator = Paginator::new(&service, QueryOptions::default());

        let ticket = paginator.begin_first_page(&[], FIRST_PAGE);
        paginator.complete(ticket, &[], Ok(events(1, 10)));

        assert!(paginator.request_page(&[], 1).is_none());
        assert_eq!(paginator.items().len(), 10);

        let next = paginator.request_page(&[], 2).unwrap();
        assert_eq!(next.page_key(), 2);
    }

    #[test]
    fn test_superseded_ticket_is_ignored() {
        let service = FakeSearch::default();
        let mut paginator = Paginator::new(&service, QueryOptions::default());

        let old = paginator.begin_first_page(&[], FIRST_PAGE);
        let new = paginator.begin_first_page(&[], FIRST_PAGE);

        assert_eq!(
            paginator.complete(old, &[], Ok(events(1, 10))),
            PageOutcome::StaleIgnored
        );
        assert!(paginator.is_loading());

        assert_eq!(
            paginator.complete(new, &[], Ok(events(100, 2))),
            PageOutcome::Loaded {
                received: 2,
                is_last_page: true
            }
        );
        assert_eq!(paginator.items()[0].id, 100);
    }

    #[test]
    fn test_result_for_changed_filters_is_ignored() {
        let service = FakeSearch::default();
        let mut paginator = Paginator::new(&service, QueryOptions::default());
        let before = football();
        let after = vec![Filter::reference(FilterKind::SportCategory, 7, "Хоккей").unwrap()];

        let ticket = paginator.begin_first_page(&before, FIRST_PAGE);
        let outcome = paginator.complete(ticket, &after, Ok(events(1, 10)));

        assert_eq!(outcome, PageOutcome::StaleIgnored);
        assert!(paginator.items().is_empty());
        assert!(paginator.is_loading());
        assert!(paginator.begin_next_page(&after).is_none());

        let restart = paginator.begin_first_page(&after, FIRST_PAGE);
        assert_eq!(
            paginator.complete(restart, &after, Ok(events(1, 3))),
            PageOutcome::Loaded {
                received: 3,
                is_last_page: true
            }
        );
    }

    #[tokio::test]
    async fn test_no_next_page_after_highest_page_key() {
        let service = FakeSearch::default().with_page(u32::MAX, Ok(events(1, 10)));
        let mut paginator = Paginator::new(&service, QueryOptions::default());

        let first = paginator.start(&[], u32::MAX).await;
        assert_eq!(
            first,
            PageOutcome::Loaded {
                received: 10,
                is_last_page: false
            }
        );

        assert_eq!(paginator.request_next_page(&[]).await, PageOutcome::Skipped);
        assert!(paginator.request_page(&[], u32::MAX).is_none());
        assert_eq!(paginator.items().len(), 10);
        assert!(!paginator.is_loading());
        assert_eq!(*service.calls.lock().unwrap(), vec![u32::MAX]);
    }
}
