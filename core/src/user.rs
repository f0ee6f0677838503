//! User resource accessor.
//!
//! # Design
//! A `User` is a profile snapshot plus a borrowed request client. Field
//! accessors read the snapshot; every other method issues exactly one
//! request through the client and wraps what comes back. Nothing is cached
//! and nothing is retried, so calling a fetch method twice hits the API
//! twice.

use std::fmt;

use tracing::debug;

use crate::client::RequestClient;
use crate::error::Result;
use crate::http::Query;
use crate::record::Record;
use crate::resource::{Group, OwnedBook, Review, Shelf, UserProfile};

/// Page requested when the caller has no preference.
pub const DEFAULT_PAGE: u32 = 1;

/// Groups returned per page by the groups endpoint.
pub const GROUPS_PER_PAGE: usize = 30;

/// API version marker sent to the review endpoints.
const API_VERSION: u32 = 2;

/// Optional sorting and paging for `User::shelf`.
///
/// `sort` and `order` only apply together, and `page`/`per_page` only apply
/// when both of them do. Empty strings and zero count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShelfQuery<'a> {
    /// Field to sort on, e.g. `title`, `author`, `rating`, `date_read`.
    pub sort: Option<&'a str>,
    /// `a` for ascending, `d` for descending.
    pub order: Option<&'a str>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl<'a> ShelfQuery<'a> {
    pub fn sorted(sort: &'a str, order: &'a str) -> Self {
        Self {
            sort: Some(sort),
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }

    fn apply(&self, payload: &mut Query) {
        let sort = self.sort.filter(|s| !s.is_empty());
        let order = self.order.filter(|o| !o.is_empty());
        // TODO: decide whether page/per_page should apply without sort+order;
        // the API accepts them on their own.
        if let (Some(sort), Some(order)) = (sort, order) {
            payload.push("sort", sort).push("order", order);
            if let Some(page) = self.page.filter(|p| *p != 0) {
                payload.push("page", page);
            }
            if let Some(per_page) = self.per_page.filter(|p| *p != 0) {
                payload.push("per_page", per_page);
            }
        }
    }
}

/// A Goodreads user with access to their related collections.
pub struct User<'c, C: ?Sized> {
    profile: UserProfile,
    client: &'c C,
}

impl<'c, C: RequestClient + ?Sized> User<'c, C> {
    pub fn new(profile: Record, client: &'c C) -> Self {
        Self {
            profile: UserProfile::new(profile),
            client,
        }
    }

    /// Build from a lookup response holding a `user` element.
    pub fn from_response(response: &Record, client: &'c C) -> Result<Self> {
        Ok(Self::new(response.record_at(&["user"])?, client))
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// Goodreads ID for the user.
    pub fn gid(&self) -> Result<&str> {
        self.profile.gid()
    }

    /// Goodreads handle.
    pub fn user_name(&self) -> Result<&str> {
        self.profile.user_name()
    }

    pub fn name(&self) -> Result<&str> {
        self.profile.name()
    }

    /// Profile URL.
    pub fn link(&self) -> Result<&str> {
        self.profile.link()
    }

    pub fn image_url(&self) -> Result<&str> {
        self.profile.image_url()
    }

    pub fn small_image_url(&self) -> Result<&str> {
        self.profile.small_image_url()
    }

    /// Groups the user belongs to, one page at a time.
    ///
    /// The API returns at most `GROUPS_PER_PAGE` groups per page; ask for the
    /// next page to get more.
    pub fn list_groups(&self, page: u32) -> Result<Vec<Group>> {
        let gid = self.gid()?;
        debug!(user = %self, page, "listing groups");
        let resp = self
            .client
            .request(&format!("group/list/{gid}.xml"), &Query::new().with("page", page))?;
        Ok(wrap_all(resp.records_at(&["groups", "list"], "group")?))
    }

    /// Books the user owns.
    pub fn owned_books(&self, page: u32) -> Result<Vec<OwnedBook>> {
        let gid = self.gid()?;
        debug!(user = %self, page, "listing owned books");
        let query = Query::new().with("page", page).with("format", "xml");
        let resp = self
            .client
            .session_get(&format!("owned_books/user/{gid}.xml"), &query)?;
        Ok(wrap_all(resp.records_at(&["owned_books"], "owned_book")?))
    }

    /// The user's read status, returned as fetched.
    pub fn read_status(&self) -> Result<Record> {
        let gid = self.gid()?;
        debug!(user = %self, "fetching read status");
        let resp = self
            .client
            .request(&format!("read_statuses/{gid}"), &Query::new())?;
        resp.record_at(&["read_status"])
    }

    /// All books and reviews on the user's shelves.
    pub fn reviews(&self, page: u32) -> Result<Vec<Review>> {
        let gid = self.gid()?;
        debug!(user = %self, page, "listing reviews");
        let query = Query::new()
            .with("v", API_VERSION)
            .with("id", gid)
            .with("page", page);
        let resp = self.client.session_get("/review/list.xml", &query)?;
        Ok(wrap_all(resp.records_at(&["reviews"], "review")?))
    }

    /// The user's shelves. Only users with a public profile expose them; for
    /// others the API answers with whatever it allows.
    pub fn shelves(&self, page: u32) -> Result<Vec<Shelf>> {
        let gid = self.gid()?;
        debug!(user = %self, page, "listing shelves");
        let query = Query::new().with("user_id", gid).with("page", page);
        let resp = self.client.request("shelf/list.xml", &query)?;
        Ok(wrap_all(resp.records_at(&["shelves"], "user_shelf")?))
    }

    /// Reviews on the shelf called `shelf_name` (`read`,
    /// `currently-reading`, ...).
    pub fn shelf(&self, shelf_name: &str, options: &ShelfQuery<'_>) -> Result<Vec<Review>> {
        let gid = self.gid()?;
        debug!(user = %self, shelf = shelf_name, "listing shelf contents");
        let payload = self.shelf_payload(shelf_name, options);
        let resp = self.client.request(&format!("/review/list/{gid}"), &payload)?;
        Ok(wrap_all(resp.records_at(&["reviews"], "review")?))
    }

    fn shelf_payload(&self, shelf_name: &str, options: &ShelfQuery<'_>) -> Query {
        let mut payload = Query::new()
            .with("key", self.client.client_key())
            .with("v", API_VERSION)
            .with("shelf", shelf_name);
        options.apply(&mut payload);
        payload
    }
}

fn wrap_all<T: From<Record>>(records: Vec<Record>) -> Vec<T> {
    records.into_iter().map(T::from).collect()
}

/// The handle when set, otherwise the id.
impl<C: ?Sized> fmt::Display for User<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.profile.label())
    }
}

impl<C: ?Sized> fmt::Debug for User<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User").field("profile", &self.profile).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GoodreadsError, RequestError};
    use serde_json::{json, Value};
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Via {
        Request,
        Session,
    }

    #[derive(Debug, Clone)]
    struct Call {
        via: Via,
        path: String,
        query: Query,
    }

    /// Records every call and answers with a fixed response (or status).
    struct FakeClient {
        response: Value,
        fail_with: Option<u16>,
        calls: RefCell<Vec<Call>>,
    }

    impl FakeClient {
        fn answering(response: Value) -> Self {
            Self {
                response,
                fail_with: None,
                calls: RefCell::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Value::Null,
                fail_with: Some(status),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn answer(&self, via: Via, path: &str, query: &Query) -> Result<Record> {
            self.calls.borrow_mut().push(Call {
                via,
                path: path.to_string(),
                query: query.clone(),
            });
            if let Some(status) = self.fail_with {
                return Err(RequestError::Status {
                    status,
                    body: "internal error".to_string(),
                }
                .into());
            }
            Record::from_value(self.response.clone())
        }

        fn only_call(&self) -> Call {
            let calls = self.calls.borrow();
            assert_eq!(calls.len(), 1, "expected exactly one call");
            calls[0].clone()
        }
    }

    impl RequestClient for FakeClient {
        fn client_key(&self) -> &str {
            "test-key"
        }

        fn request(&self, path: &str, query: &Query) -> Result<Record> {
            self.answer(Via::Request, path, query)
        }

        fn session_get(&self, path: &str, query: &Query) -> Result<Record> {
            self.answer(Via::Session, path, query)
        }
    }

    fn profile(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn jdoe() -> Record {
        profile(json!({
            "id": "123",
            "user_name": "jdoe",
            "name": "Jane Doe",
            "link": "https://www.goodreads.com/user/show/123-jane",
            "image_url": "https://images.example/123.jpg",
            "small_image_url": "https://images.example/123s.jpg"
        }))
    }

    #[test]
    fn field_accessors_return_backing_values() {
        let client = FakeClient::answering(Value::Null);
        let user = User::new(jdoe(), &client);
        assert_eq!(user.gid().unwrap(), "123");
        assert_eq!(user.user_name().unwrap(), "jdoe");
        assert_eq!(user.name().unwrap(), "Jane Doe");
        assert_eq!(user.link().unwrap(), "https://www.goodreads.com/user/show/123-jane");
        assert_eq!(user.image_url().unwrap(), "https://images.example/123.jpg");
        assert_eq!(user.small_image_url().unwrap(), "https://images.example/123s.jpg");
        assert!(client.calls.borrow().is_empty());
    }

    #[test]
    fn missing_field_is_reported_by_name() {
        let client = FakeClient::answering(Value::Null);
        let user = User::new(profile(json!({"id": "123"})), &client);
        let err = user.small_image_url().unwrap_err();
        assert!(matches!(err, GoodreadsError::MissingField { field } if field == "small_image_url"));
    }

    #[test]
    fn display_prefers_handle() {
        let client = FakeClient::answering(Value::Null);
        let user = User::new(profile(json!({"id": "123", "user_name": "jdoe"})), &client);
        assert_eq!(user.to_string(), "jdoe");
    }

    #[test]
    fn display_falls_back_to_id() {
        let client = FakeClient::answering(Value::Null);
        let user = User::new(profile(json!({"id": "123", "user_name": ""})), &client);
        assert_eq!(user.to_string(), "123");
        let user = User::new(profile(json!({"id": "123"})), &client);
        assert_eq!(user.to_string(), "123");
    }

    #[test]
    fn list_groups_requests_page_and_returns_groups() {
        let client = FakeClient::answering(json!({
            "groups": {"list": {"group": [
                {"id": "1", "title": "Sci-Fi"},
                {"id": "2", "title": "Poetry"}
            ]}}
        }));
        let user = User::new(jdoe(), &client);
        let groups = user.list_groups(2).unwrap();

        let call = client.only_call();
        assert_eq!(call.via, Via::Request);
        assert_eq!(call.path, "group/list/123.xml");
        assert_eq!(call.query.get("page"), Some("2"));
        let titles: Vec<_> = groups.iter().map(|g| g.title().unwrap()).collect();
        assert_eq!(titles, vec!["Sci-Fi", "Poetry"]);
    }

    #[test]
    fn list_groups_without_list_is_malformed() {
        let client = FakeClient::answering(json!({"groups": {"@start": "1"}}));
        let user = User::new(jdoe(), &client);
        assert!(matches!(
            user.list_groups(DEFAULT_PAGE).unwrap_err(),
            GoodreadsError::MalformedResponse(_)
        ));
    }

    #[test]
    fn owned_books_goes_through_session() {
        let client = FakeClient::answering(json!({
            "owned_books": {"owned_book": {"id": "77", "book": {"id": "5", "title": "Dune"}}}
        }));
        let user = User::new(jdoe(), &client);
        let books = user.owned_books(DEFAULT_PAGE).unwrap();

        let call = client.only_call();
        assert_eq!(call.via, Via::Session);
        assert_eq!(call.path, "owned_books/user/123.xml");
        assert_eq!(call.query.get("page"), Some("1"));
        assert_eq!(call.query.get("format"), Some("xml"));
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].book().unwrap().title().unwrap(), "Dune");
    }

    #[test]
    fn read_status_is_passed_through() {
        let client = FakeClient::answering(json!({
            "read_status": {"id": "9", "status": "read", "review_id": "100"}
        }));
        let user = User::new(jdoe(), &client);
        let status = user.read_status().unwrap();

        let call = client.only_call();
        assert_eq!(call.path, "read_statuses/123");
        assert!(call.query.is_empty());
        assert_eq!(status.text("status").unwrap(), "read");
        assert_eq!(status.fields().len(), 3);
    }

    #[test]
    fn reviews_sends_version_id_and_page() {
        let client = FakeClient::answering(json!({
            "reviews": {"review": [{"id": "100", "rating": "5"}, {"id": "101", "rating": "3"}]}
        }));
        let user = User::new(jdoe(), &client);
        let reviews = user.reviews(3).unwrap();

        let call = client.only_call();
        assert_eq!(call.via, Via::Session);
        assert_eq!(call.path, "/review/list.xml");
        let pairs: Vec<_> = call.query.iter().collect();
        assert_eq!(pairs, vec![("v", "2"), ("id", "123"), ("page", "3")]);
        assert_eq!(reviews.len(), 2);
        assert_eq!(reviews[1].rating().unwrap(), "3");
    }

    #[test]
    fn reviews_propagates_server_error() {
        let client = FakeClient::failing(500);
        let user = User::new(jdoe(), &client);
        let err = user.reviews(DEFAULT_PAGE).unwrap_err();
        assert!(matches!(
            err,
            GoodreadsError::RemoteRequest(RequestError::Status { status: 500, .. })
        ));
        assert_eq!(client.calls.borrow().len(), 1);
    }

    #[test]
    fn shelves_returns_user_shelves() {
        let client = FakeClient::answering(json!({
            "shelves": {"user_shelf": [
                {"id": "1", "name": "read", "book_count": "10"},
                {"id": "2", "name": "to-read", "book_count": "4"}
            ]}
        }));
        let user = User::new(jdoe(), &client);
        let shelves = user.shelves(DEFAULT_PAGE).unwrap();

        let call = client.only_call();
        assert_eq!(call.path, "shelf/list.xml");
        assert_eq!(call.query.get("user_id"), Some("123"));
        assert_eq!(shelves.iter().map(|s| s.to_string()).collect::<Vec<_>>(), vec!["read", "to-read"]);
    }

    #[test]
    fn shelves_of_private_profile_is_empty() {
        let client = FakeClient::answering(json!({"shelves": null}));
        let user = User::new(jdoe(), &client);
        assert!(user.shelves(DEFAULT_PAGE).unwrap().is_empty());
    }

    fn shelf_call(options: ShelfQuery<'_>) -> Call {
        let client = FakeClient::answering(json!({"reviews": {"review": {"id": "100"}}}));
        let user = User::new(jdoe(), &client);
        let reviews = user.shelf("read", &options).unwrap();
        assert_eq!(reviews.len(), 1);
        client.only_call()
    }

    #[test]
    fn shelf_payload_always_has_key_version_and_shelf() {
        let call = shelf_call(ShelfQuery::default());
        assert_eq!(call.via, Via::Request);
        assert_eq!(call.path, "/review/list/123");
        let pairs: Vec<_> = call.query.iter().collect();
        assert_eq!(pairs, vec![("key", "test-key"), ("v", "2"), ("shelf", "read")]);
    }

    #[test]
    fn shelf_sort_without_order_is_ignored() {
        let call = shelf_call(ShelfQuery {
            sort: Some("title"),
            page: Some(2),
            per_page: Some(50),
            ..ShelfQuery::default()
        });
        for name in ["sort", "order", "page", "per_page"] {
            assert!(!call.query.contains(name), "{name} should not be sent");
        }
    }

    #[test]
    fn shelf_order_without_sort_is_ignored() {
        let call = shelf_call(ShelfQuery {
            order: Some("d"),
            ..ShelfQuery::default()
        });
        assert!(!call.query.contains("order"));
    }

    #[test]
    fn shelf_sort_and_order_enable_paging() {
        let call = shelf_call(ShelfQuery::sorted("title", "a").page(2));
        assert_eq!(call.query.get("sort"), Some("title"));
        assert_eq!(call.query.get("order"), Some("a"));
        assert_eq!(call.query.get("page"), Some("2"));
        assert!(!call.query.contains("per_page"));
    }

    #[test]
    fn shelf_per_page_needs_sort_and_order() {
        let call = shelf_call(ShelfQuery::sorted("rating", "d").per_page(20));
        assert_eq!(call.query.get("per_page"), Some("20"));
        assert!(!call.query.contains("page"));
    }

    #[test]
    fn fetch_without_id_fails_before_request() {
        let client = FakeClient::answering(Value::Null);
        let user = User::new(profile(json!({"user_name": "ghost"})), &client);
        assert!(matches!(
            user.shelves(DEFAULT_PAGE).unwrap_err(),
            GoodreadsError::MissingField { .. }
        ));
        assert!(client.calls.borrow().is_empty());
    }
}
