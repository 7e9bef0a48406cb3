use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use tracing::{error, info, warn};
use crate::books::domain::model::BookEntity;
use crate::books::dto::BookDto;
use crate::books::repository::BookRepository;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::library::{BookStatus, LibraryError, LibraryResult};
use crate::core::repository::scan_all;
use crate::ledger::domain::{BookFilter, LedgerService, rules};
use crate::ledger::dto::{LedgerSummaryDto, LendingDto};
use crate::members::domain::model::MemberEntity;
use crate::members::repository::MemberRepository;

const UNDO_ATTEMPTS: usize = 3;

pub struct LedgerServiceImpl {
    loan_days: i64,
    book_repository: Arc<dyn BookRepository>,
    member_repository: Arc<dyn MemberRepository>,
    clock: Arc<dyn Clock>,
}

impl LedgerServiceImpl {
    pub fn new(config: &Configuration,
               book_repository: Arc<dyn BookRepository>,
               member_repository: Arc<dyn MemberRepository>,
               clock: Arc<dyn Clock>) -> Self {
        Self {
            loan_days: config.book_loan_days,
            book_repository,
            member_repository,
            clock,
        }
    }

    async fn all_books(&self) -> LibraryResult<Vec<BookEntity>> {
        let mut books: Vec<BookEntity> = scan_all(self.book_repository.as_ref()).await?;
        books.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.book_id.cmp(&b.book_id)));
        Ok(books)
    }

    async fn member_names(&self) -> LibraryResult<HashMap<String, String>> {
        let members: Vec<MemberEntity> = scan_all(self.member_repository.as_ref()).await?;
        Ok(members.into_iter().map(|m| (m.member_id, m.display_name)).collect())
    }

    // a borrower removed from the registry keeps the book but loses the name
    async fn borrower_name(&self, book: &BookEntity) -> LibraryResult<Option<String>> {
        match &book.borrower_id {
            Some(member_id) => match self.member_repository.get(member_id.as_str()).await {
                Ok(member) => Ok(Some(member.display_name)),
                Err(LibraryError::NotFound { .. }) => Ok(None),
                Err(err) => Err(err),
            },
            None => Ok(None),
        }
    }

    // Takes back a checkout this batch wrote. A rival write may have queued reservations since,
    // so the book is handed on the way a return would; a book already passed on needs nothing.
    async fn undo_checkout(&self, member_id: &str, written: &BookEntity) -> LibraryResult<()> {
        let mut current = written.clone();
        for _ in 0..UNDO_ATTEMPTS {
            if current.borrower_id.as_deref() != Some(member_id) || current.checkout_at != written.checkout_at {
                return Ok(());
            }
            let mut released = current.clone();
            rules::return_book(&mut released, self.clock.now(), self.loan_days)?;
            match self.book_repository.update(&released).await {
                Ok(_) => return Ok(()),
                Err(LibraryError::Conflict { .. }) => {
                    current = self.book_repository.get(written.book_id.as_str()).await?;
                }
                Err(err) => return Err(err),
            }
        }
        Err(LibraryError::conflict(
            format!("book {} kept changing while its checkout was undone", written.book_id).as_str(),
            vec![written.book_id.to_string()]))
    }

    // returns the books that are still checked out to the member
    async fn compensate(&self, member_id: &str, written: &[BookEntity]) -> Vec<String> {
        let mut stranded = vec![];
        for book in written.iter().rev() {
            if let Err(err) = self.undo_checkout(member_id, book).await {
                error!(book_id = book.book_id.as_str(), member_id, error = %err, "failed to undo checkout of book");
                stranded.push(book.book_id.to_string());
            }
        }
        stranded
    }
}

fn to_lending(book: &BookEntity, now: NaiveDateTime, borrower_name: Option<String>) -> LendingDto {
    LendingDto {
        book: BookDto::from(book),
        overdue: rules::is_overdue(book, now),
        borrower_name,
    }
}

fn matches_search(entry: &LendingDto, text: &str) -> bool {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return true;
    }
    let book = &entry.book;
    [book.title.as_str(), book.author.as_str(), book.isbn.as_str(), book.genre.as_str()].iter()
        .chain(entry.borrower_name.as_deref().iter())
        .any(|field| field.to_lowercase().contains(text.as_str()))
}

fn matches_filter(entry: &LendingDto, filter: &BookFilter) -> bool {
    match filter {
        BookFilter::All => true,
        BookFilter::Available => entry.book.book_status == BookStatus::Available,
        BookFilter::CheckedOut => entry.book.book_status == BookStatus::CheckedOut,
        BookFilter::Overdue => entry.overdue,
        BookFilter::Search(text) => matches_search(entry, text.as_str()),
    }
}

#[async_trait]
impl LedgerService for LedgerServiceImpl {
    async fn check_out(&self, book_ids: &[String], member_id: &str,
                       due_at: Option<NaiveDateTime>) -> LibraryResult<Vec<BookDto>> {
        let mut ids: Vec<&str> = vec![];
        for id in book_ids.iter().map(|id| id.trim()) {
            if !id.is_empty() && !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(LibraryError::validation("at least one book id is required", Some("400".to_string())));
        }
        self.member_repository.get(member_id).await?;

        let now = self.clock.now();
        let due_at = due_at.unwrap_or_else(|| now + Duration::days(self.loan_days));
        if due_at <= now {
            return Err(LibraryError::validation(
                format!("due date {} must be after {}", due_at, now).as_str(), Some("400".to_string())));
        }

        let mut books = vec![];
        for id in &ids {
            books.push(self.book_repository.get(id).await?);
        }
        let unavailable: Vec<String> = books.iter()
            .filter(|b| b.book_status != BookStatus::Available)
            .map(|b| b.book_id.to_string())
            .collect();
        if !unavailable.is_empty() {
            warn!(member_id, book_ids = ?unavailable, "rejected checkout of unavailable books");
            return Err(LibraryError::conflict(
                format!("books not available: {}", unavailable.join(", ")).as_str(), unavailable));
        }

        let mut pending = vec![];
        for mut book in books {
            rules::check_out(&mut book, member_id, now, due_at)?;
            pending.push(book);
        }

        let mut written: Vec<BookEntity> = vec![];
        for mut book in pending {
            if let Err(err) = self.book_repository.update(&book).await {
                warn!(book_id = book.book_id.as_str(), error = %err, "checkout lost a race, undoing batch");
                let stranded = self.compensate(member_id, &written).await;
                if !stranded.is_empty() {
                    return Err(LibraryError::partial_checkout(
                        format!("checkout of book {} failed and books {} are still lent to member {}",
                                book.book_id, stranded.join(", "), member_id).as_str(), stranded));
                }
                return Err(match err {
                    LibraryError::Conflict { .. } => LibraryError::conflict(
                        format!("book {} was changed by another request", book.book_id).as_str(),
                        vec![book.book_id.to_string()]),
                    other => other,
                });
            }
            book.version += 1;
            written.push(book);
        }

        info!(member_id, books = written.len(), due_at = %due_at, "books checked out");
        Ok(written.iter().map(BookDto::from).collect())
    }

    async fn return_book(&self, book_id: &str) -> LibraryResult<BookDto> {
        let mut book = self.book_repository.get(book_id).await?;
        let now = self.clock.now();
        let next = rules::return_book(&mut book, now, self.loan_days).map_err(|err| {
            warn!(book_id, "rejected return of book that is not checked out");
            err
        })?;
        self.book_repository.update(&book).await?;
        book.version += 1;
        debug_assert!(rules::is_consistent(&book));
        match next {
            Some(member_id) => info!(book_id, member_id = member_id.as_str(), "book returned and handed to next reservation"),
            None => info!(book_id, "book returned to shelf"),
        }
        Ok(BookDto::from(&book))
    }

    async fn reserve_book(&self, book_id: &str, member_id: &str) -> LibraryResult<BookDto> {
        let mut book = self.book_repository.get(book_id).await?;
        self.member_repository.get(member_id).await?;
        rules::reserve(&mut book, member_id, self.clock.now()).map_err(|err| {
            warn!(book_id, member_id, error = %err, "rejected reservation");
            err
        })?;
        self.book_repository.update(&book).await?;
        book.version += 1;
        info!(book_id, member_id, position = book.reservations.len(), "book reserved");
        Ok(BookDto::from(&book))
    }

    async fn list_books(&self, filter: &BookFilter) -> LibraryResult<Vec<LendingDto>> {
        let now = self.clock.now();
        let books = self.all_books().await?;
        let names = self.member_names().await?;
        Ok(books.iter()
            .map(|book| {
                let name = book.borrower_id.as_ref().and_then(|id| names.get(id)).cloned();
                to_lending(book, now, name)
            })
            .filter(|entry| matches_filter(entry, filter))
            .collect())
    }

    async fn book_status(&self, book_id: &str) -> LibraryResult<LendingDto> {
        let book = self.book_repository.get(book_id).await?;
        let name = self.borrower_name(&book).await?;
        Ok(to_lending(&book, self.clock.now(), name))
    }

    async fn summary(&self) -> LibraryResult<LedgerSummaryDto> {
        let now = self.clock.now();
        let books = self.all_books().await?;
        let members: Vec<MemberEntity> = scan_all(self.member_repository.as_ref()).await?;
        let mut summary = LedgerSummaryDto {
            total_books: books.len(),
            members: members.len(),
            ..Default::default()
        };
        for book in &books {
            match book.book_status {
                BookStatus::Available => summary.available += 1,
                BookStatus::CheckedOut => summary.checked_out += 1,
            }
            if rules::is_overdue(book, now) {
                summary.overdue += 1;
            }
            if !book.reservations.is_empty() {
                summary.reserved += 1;
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use async_trait::async_trait;
    use chrono::Duration;
    use crate::books::domain::model::BookEntity;
    use crate::books::repository::BookRepository;
    use crate::books::repository::memory_book_repository::MemoryBookRepository;
    use crate::core::clock::Clock;
    use crate::core::clock::fixed::FixedClock;
    use crate::core::domain::Configuration;
    use crate::core::library::{BookStatus, LibraryError, LibraryResult, PaginatedResult};
    use crate::core::repository::Repository;
    use crate::ledger::domain::{BookFilter, LedgerService, rules};
    use crate::ledger::factory;
    use crate::members::domain::model::MemberEntity;
    use crate::members::repository::MemberRepository;
    use crate::members::repository::memory_member_repository::MemoryMemberRepository;

    struct Fixture {
        clock: Arc<FixedClock>,
        books: Arc<dyn BookRepository>,
        members: Arc<dyn MemberRepository>,
        ledger: Arc<dyn LedgerService>,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(FixedClock::new());
            let books: Arc<dyn BookRepository> = Arc::new(MemoryBookRepository::new());
            let members: Arc<dyn MemberRepository> = Arc::new(MemoryMemberRepository::new());
            let ledger = factory::create_ledger_service(
                &Configuration::new("test"), books.clone(), members.clone(), clock.clone());
            Self { clock, books, members, ledger }
        }

        async fn add_book(&self, title: &str) -> String {
            let book = BookEntity::new(title, "Frank Herbert", "9780441013593", "Sci-Fi");
            self.books.create(&book).await.expect("should create book");
            book.book_id
        }

        async fn add_member(&self, name: &str) -> String {
            let member = MemberEntity::new(name, format!("{}@example.org", name.to_lowercase()).as_str());
            self.members.create(&member).await.expect("should create member");
            member.member_id
        }

        async fn book(&self, id: &str) -> BookEntity {
            self.books.get(id).await.expect("should return book")
        }
    }

    #[tokio::test]
    async fn test_should_check_out_and_return_to_shelf() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let alice = fx.add_member("Alice").await;
        let now = fx.clock.now();

        let books = fx.ledger.check_out(&[book_id.clone()], alice.as_str(), None).await.expect("should check out");
        assert_eq!(1, books.len());
        let book = fx.book(book_id.as_str()).await;
        assert_eq!(BookStatus::CheckedOut, book.book_status);
        assert_eq!(Some(alice.clone()), book.borrower_id);
        assert_eq!(Some(now), book.checkout_at);
        assert_eq!(Some(now + Duration::days(14)), book.due_at);

        fx.ledger.return_book(book_id.as_str()).await.expect("should return book");
        let book = fx.book(book_id.as_str()).await;
        assert_eq!(BookStatus::Available, book.book_status);
        assert_eq!(None, book.borrower_id);
        assert_eq!(None, book.due_at);
        assert!(rules::is_consistent(&book));
    }

    #[tokio::test]
    async fn test_should_hand_returned_book_to_first_reservation() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let alice = fx.add_member("Alice").await;
        let bob = fx.add_member("Bob").await;
        let carol = fx.add_member("Carol").await;

        fx.ledger.check_out(&[book_id.clone()], alice.as_str(), None).await.expect("should check out");
        fx.ledger.reserve_book(book_id.as_str(), bob.as_str()).await.expect("should reserve");
        fx.ledger.reserve_book(book_id.as_str(), carol.as_str()).await.expect("should reserve");

        fx.clock.advance(Duration::days(3));
        let later = fx.clock.now();
        let returned = fx.ledger.return_book(book_id.as_str()).await.expect("should return book");
        assert_eq!(BookStatus::CheckedOut, returned.book_status);
        assert_eq!(Some(bob.clone()), returned.borrower_id);
        assert_eq!(Some(later), returned.checkout_at);
        assert_eq!(Some(later + Duration::days(14)), returned.due_at);
        assert_eq!(vec![carol.clone()], returned.reservations);

        let stored = fx.book(book_id.as_str()).await;
        assert_eq!(returned.borrower_id, stored.borrower_id);
        assert_eq!(returned.version, stored.version);
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_reservations() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let alice = fx.add_member("Alice").await;
        let bob = fx.add_member("Bob").await;

        fx.ledger.check_out(&[book_id.clone()], alice.as_str(), None).await.expect("should check out");
        let res = fx.ledger.reserve_book(book_id.as_str(), alice.as_str()).await;
        assert!(matches!(res, Err(LibraryError::DuplicateReservation { .. })));

        fx.ledger.reserve_book(book_id.as_str(), bob.as_str()).await.expect("should reserve");
        let res = fx.ledger.reserve_book(book_id.as_str(), bob.as_str()).await;
        assert!(matches!(res, Err(LibraryError::DuplicateReservation { .. })));
        assert_eq!(vec![bob], fx.book(book_id.as_str()).await.reservations);
    }

    #[tokio::test]
    async fn test_should_reject_return_of_available_book() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let before = fx.book(book_id.as_str()).await;

        let res = fx.ledger.return_book(book_id.as_str()).await;
        assert_eq!(Err(LibraryError::invalid_state("book is not currently checked out")), res);
        assert_eq!(before, fx.book(book_id.as_str()).await);
    }

    #[tokio::test]
    async fn test_should_report_overdue_books() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        fx.add_book("1984").await;
        let alice = fx.add_member("Alice").await;
        let due_at = fx.clock.now() + Duration::days(14);

        fx.ledger.check_out(&[book_id.clone()], alice.as_str(), Some(due_at)).await.expect("should check out");
        assert!(fx.ledger.list_books(&BookFilter::Overdue).await.expect("should list").is_empty());

        fx.clock.advance(Duration::days(15));
        let overdue = fx.ledger.list_books(&BookFilter::Overdue).await.expect("should list");
        assert_eq!(1, overdue.len());
        assert_eq!(book_id, overdue[0].book.book_id);
        assert!(overdue[0].overdue);
        assert_eq!(Some("Alice".to_string()), overdue[0].borrower_name);

        let status = fx.ledger.book_status(book_id.as_str()).await.expect("should return status");
        assert!(status.overdue);
        assert_eq!(1, fx.ledger.summary().await.expect("should summarize").overdue);

        // returning late clears the overdue flag everywhere
        fx.ledger.return_book(book_id.as_str()).await.expect("should return book");
        assert!(fx.ledger.list_books(&BookFilter::Overdue).await.expect("should list").is_empty());
        let status = fx.ledger.book_status(book_id.as_str()).await.expect("should return status");
        assert!(!status.overdue);
        assert_eq!(None, status.borrower_name);
        assert_eq!(0, fx.ledger.summary().await.expect("should summarize").overdue);
        assert!(!rules::is_overdue(&fx.book(book_id.as_str()).await, fx.clock.now()));
    }

    #[tokio::test]
    async fn test_should_reject_batch_with_unavailable_book() {
        let fx = Fixture::new();
        let first = fx.add_book("Dune").await;
        let second = fx.add_book("Dune Messiah").await;
        let third = fx.add_book("Children of Dune").await;
        let alice = fx.add_member("Alice").await;
        let bob = fx.add_member("Bob").await;

        fx.ledger.check_out(&[second.clone()], alice.as_str(), None).await.expect("should check out");
        let res = fx.ledger.check_out(&[first.clone(), second.clone(), third.clone()], bob.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::Conflict { ref book_ids, .. }) if book_ids == &vec![second.clone()]));

        assert_eq!(BookStatus::Available, fx.book(first.as_str()).await.book_status);
        assert_eq!(BookStatus::Available, fx.book(third.as_str()).await.book_status);
        assert_eq!(0, fx.book(first.as_str()).await.version);
        assert_eq!(Some(alice), fx.book(second.as_str()).await.borrower_id);
    }

    // Loses versioned updates of chosen books as if another request always got there first. Each
    // contested book lets its first `n` updates through; the rival request may also queue one
    // reservation when it wins.
    struct ContestedBookRepository {
        inner: MemoryBookRepository,
        contested: Mutex<HashMap<String, usize>>,
        rival_reservation: Mutex<Option<(String, String)>>,
    }

    impl ContestedBookRepository {
        fn new() -> Self {
            Self { inner: MemoryBookRepository::new(), contested: Mutex::new(HashMap::new()), rival_reservation: Mutex::new(None) }
        }

        fn contest(&self, book_id: &str, updates_let_through: usize) {
            self.contested.lock().expect("lock").insert(book_id.to_string(), updates_let_through);
        }

        fn lost_race(&self, book_id: &str) -> bool {
            match self.contested.lock().expect("lock").get_mut(book_id) {
                Some(0) => true,
                Some(n) => {
                    *n -= 1;
                    false
                }
                None => false,
            }
        }
    }

    #[async_trait]
    impl Repository<BookEntity> for ContestedBookRepository {
        async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
            self.inner.create(entity).await
        }

        async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
            if self.lost_race(entity.book_id.as_str()) {
                let rival = self.rival_reservation.lock().expect("lock").take();
                if let Some((book_id, member_id)) = rival {
                    let mut book = self.inner.get(book_id.as_str()).await?;
                    book.reservations.push(member_id);
                    self.inner.update(&book).await?;
                }
                return Err(LibraryError::conflict("stale version", vec![entity.book_id.to_string()]));
            }
            self.inner.update(entity).await
        }

        async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
            self.inner.get(id).await
        }

        async fn delete(&self, entity: &BookEntity) -> LibraryResult<usize> {
            self.inner.delete(entity).await
        }

        async fn query(&self, predicate: &HashMap<String, String>,
                       page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
            self.inner.query(predicate, page, page_size).await
        }

        async fn scan(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
            self.inner.scan(page, page_size).await
        }
    }

    #[async_trait]
    impl BookRepository for ContestedBookRepository {
        async fn find_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<BookEntity>> {
            self.inner.find_by_isbn(isbn).await
        }
    }

    struct ContestedFixture {
        clock: Arc<FixedClock>,
        books: Arc<ContestedBookRepository>,
        ledger: Arc<dyn LedgerService>,
        first: String,
        second: String,
        alice: String,
    }

    async fn contested_fixture() -> ContestedFixture {
        let clock = Arc::new(FixedClock::new());
        let books = Arc::new(ContestedBookRepository::new());
        let members: Arc<dyn MemberRepository> = Arc::new(MemoryMemberRepository::new());
        let ledger = factory::create_ledger_service(
            &Configuration::new("test"), books.clone(), members.clone(), clock.clone());
        let first = BookEntity::new("Dune", "Frank Herbert", "9780441013593", "Sci-Fi");
        let second = BookEntity::new("Dune Messiah", "Frank Herbert", "9780593098233", "Sci-Fi");
        books.create(&first).await.expect("should create book");
        books.create(&second).await.expect("should create book");
        let alice = MemberEntity::new("Alice", "alice@example.org");
        members.create(&alice).await.expect("should create member");
        ContestedFixture { clock, books, ledger, first: first.book_id, second: second.book_id, alice: alice.member_id }
    }

    #[tokio::test]
    async fn test_should_undo_batch_when_a_write_loses_race() {
        let fx = contested_fixture().await;
        fx.books.contest(fx.second.as_str(), 0);

        let res = fx.ledger.check_out(&[fx.first.clone(), fx.second.clone()], fx.alice.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::Conflict { ref book_ids, .. }) if book_ids == &vec![fx.second.clone()]));

        let restored = fx.books.get(fx.first.as_str()).await.expect("should return book");
        assert_eq!(BookStatus::Available, restored.book_status);
        assert_eq!(None, restored.borrower_id);
        assert_eq!(None, restored.due_at);
        assert!(rules::is_consistent(&restored));
    }

    #[tokio::test]
    async fn test_should_hand_undone_book_to_reservation_made_meanwhile() {
        let fx = contested_fixture().await;
        fx.books.contest(fx.second.as_str(), 0);
        // queued on the first book while the batch still holds it
        *fx.books.rival_reservation.lock().expect("lock") = Some((fx.first.clone(), "bob".to_string()));

        let res = fx.ledger.check_out(&[fx.first.clone(), fx.second.clone()], fx.alice.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::Conflict { ref book_ids, .. }) if book_ids == &vec![fx.second.clone()]));

        let first = fx.books.get(fx.first.as_str()).await.expect("should return book");
        assert_eq!(BookStatus::CheckedOut, first.book_status);
        assert_eq!(Some("bob".to_string()), first.borrower_id);
        assert_eq!(Some(fx.clock.now() + Duration::days(14)), first.due_at);
        assert!(first.reservations.is_empty());
        assert_eq!(3, first.version);
        assert!(rules::is_consistent(&first));
        assert_eq!(BookStatus::Available, fx.books.get(fx.second.as_str()).await.expect("should return book").book_status);
    }

    #[tokio::test]
    async fn test_should_name_books_left_lent_when_undo_fails() {
        let fx = contested_fixture().await;
        // the batch's own write of the first book goes through, every later write of it is lost
        fx.books.contest(fx.first.as_str(), 1);
        fx.books.contest(fx.second.as_str(), 0);

        let res = fx.ledger.check_out(&[fx.first.clone(), fx.second.clone()], fx.alice.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::PartialCheckout { ref book_ids, .. }) if book_ids == &vec![fx.first.clone()]));

        let first = fx.books.get(fx.first.as_str()).await.expect("should return book");
        assert_eq!(BookStatus::CheckedOut, first.book_status);
        assert_eq!(Some(fx.alice.clone()), first.borrower_id);
    }

    #[tokio::test]
    async fn test_should_validate_checkout_request() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let alice = fx.add_member("Alice").await;

        let res = fx.ledger.check_out(&[], alice.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::Validation { .. })));
        let res = fx.ledger.check_out(&[book_id.clone()], "nobody", None).await;
        assert!(matches!(res, Err(LibraryError::NotFound { .. })));
        let res = fx.ledger.check_out(&["missing".to_string()], alice.as_str(), None).await;
        assert!(matches!(res, Err(LibraryError::NotFound { .. })));
        let res = fx.ledger.check_out(&[book_id.clone()], alice.as_str(), Some(fx.clock.now())).await;
        assert!(matches!(res, Err(LibraryError::Validation { .. })));

        // duplicate ids collapse into one checkout
        let books = fx.ledger.check_out(&[book_id.clone(), book_id.clone()], alice.as_str(), None).await.expect("should check out");
        assert_eq!(1, books.len());
    }

    #[tokio::test]
    async fn test_should_reject_reservation_of_available_book() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let alice = fx.add_member("Alice").await;

        let res = fx.ledger.reserve_book(book_id.as_str(), alice.as_str()).await;
        assert!(matches!(res, Err(LibraryError::InvalidState { .. })));
        let res = fx.ledger.reserve_book(book_id.as_str(), "nobody").await;
        assert!(matches!(res, Err(LibraryError::NotFound { .. })));
        assert!(fx.book(book_id.as_str()).await.reservations.is_empty());
    }

    #[tokio::test]
    async fn test_should_keep_queue_fifo_across_returns() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let mut members = vec![];
        for name in ["Alice", "Bob", "Carol", "Dave"] {
            members.push(fx.add_member(name).await);
        }
        fx.ledger.check_out(&[book_id.clone()], members[0].as_str(), None).await.expect("should check out");
        for member in &members[1..] {
            fx.ledger.reserve_book(book_id.as_str(), member.as_str()).await.expect("should reserve");
        }
        for member in &members[1..] {
            let book = fx.ledger.return_book(book_id.as_str()).await.expect("should return book");
            assert_eq!(Some(member.clone()), book.borrower_id);
            assert!(!book.reservations.contains(member));
        }
        let book = fx.ledger.return_book(book_id.as_str()).await.expect("should return book");
        assert_eq!(BookStatus::Available, book.book_status);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_should_let_one_concurrent_checkout_win() {
        let fx = Fixture::new();
        let book_id = fx.add_book("Dune").await;
        let mut handles = vec![];
        for i in 0..8 {
            let member_id = fx.add_member(format!("Member{}", i).as_str()).await;
            let ledger = fx.ledger.clone();
            let book_ids = vec![book_id.clone()];
            handles.push(tokio::spawn(async move {
                ledger.check_out(&book_ids, member_id.as_str(), None).await
            }));
        }
        let mut wins = 0;
        for handle in handles {
            match handle.await.expect("should join") {
                Ok(_) => wins += 1,
                Err(err) => assert!(matches!(err, LibraryError::Conflict { .. })),
            }
        }
        assert_eq!(1, wins);
        let book = fx.book(book_id.as_str()).await;
        assert_eq!(1, book.version);
        assert!(rules::is_consistent(&book));
    }

    #[tokio::test]
    async fn test_should_filter_and_search_books() {
        let fx = Fixture::new();
        let dune = fx.add_book("Dune").await;
        let orwell = BookEntity::new("1984", "George Orwell", "9780451524935", "Dystopian");
        fx.books.create(&orwell).await.expect("should create book");
        let alice = fx.add_member("Alice").await;
        fx.ledger.check_out(&[dune.clone()], alice.as_str(), None).await.expect("should check out");

        let all = fx.ledger.list_books(&BookFilter::All).await.expect("should list");
        assert_eq!(vec![dune.clone(), orwell.book_id.clone()], all.iter().map(|e| e.book.book_id.clone()).collect::<Vec<String>>());
        let available = fx.ledger.list_books(&BookFilter::Available).await.expect("should list");
        assert_eq!(orwell.book_id, available[0].book.book_id);
        let checked_out = fx.ledger.list_books(&BookFilter::CheckedOut).await.expect("should list");
        assert_eq!(dune, checked_out[0].book.book_id);

        let by_author = fx.ledger.list_books(&BookFilter::Search("orWELL".to_string())).await.expect("should list");
        assert_eq!(1, by_author.len());
        let by_borrower = fx.ledger.list_books(&BookFilter::Search("alice".to_string())).await.expect("should list");
        assert_eq!(dune, by_borrower[0].book.book_id);
        let by_isbn = fx.ledger.list_books(&BookFilter::Search("9780451".to_string())).await.expect("should list");
        assert_eq!(1, by_isbn.len());
        assert_eq!(2, fx.ledger.list_books(&BookFilter::Search("".to_string())).await.expect("should list").len());
    }

    #[tokio::test]
    async fn test_should_summarize_ledger() {
        let fx = Fixture::new();
        let first = fx.add_book("Dune").await;
        fx.add_book("Dune Messiah").await;
        fx.add_book("Children of Dune").await;
        let alice = fx.add_member("Alice").await;
        let bob = fx.add_member("Bob").await;

        fx.ledger.check_out(&[first.clone()], alice.as_str(), Some(fx.clock.now() + Duration::days(1))).await.expect("should check out");
        fx.ledger.reserve_book(first.as_str(), bob.as_str()).await.expect("should reserve");
        fx.clock.advance(Duration::days(2));

        let summary = fx.ledger.summary().await.expect("should summarize");
        assert_eq!(3, summary.total_books);
        assert_eq!(2, summary.available);
        assert_eq!(1, summary.checked_out);
        assert_eq!(1, summary.overdue);
        assert_eq!(2, summary.members);
        assert_eq!(1, summary.reserved);
    }
}
