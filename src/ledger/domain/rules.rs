use chrono::{Duration, NaiveDateTime};
use crate::books::domain::Book;
use crate::books::domain::model::BookEntity;
use crate::core::library::{BookStatus, LibraryError, LibraryResult};

// The lending state machine. Every transition works on a loaded record in memory; persisting it
// with a versioned update is the caller's job.

// A book is overdue once its due date has passed while it is still checked out.
pub fn is_overdue<B: Book + ?Sized>(book: &B, now: NaiveDateTime) -> bool {
    book.status() == BookStatus::CheckedOut && book.due_at().map_or(false, |due_at| due_at < now)
}

// status, borrower and lending dates move together, and the borrower never waits in their own queue
pub fn is_consistent<B: Book + ?Sized>(book: &B) -> bool {
    let lent = book.status() == BookStatus::CheckedOut;
    let fields_agree = lent == book.borrower_id().is_some()
        && lent == book.checkout_at().is_some()
        && lent == book.due_at().is_some();
    let borrower_not_queued = book.borrower_id()
        .map_or(true, |borrower| !book.reservations().iter().any(|m| m == borrower));
    let mut queue = book.reservations().to_vec();
    queue.sort();
    queue.dedup();
    fields_agree && borrower_not_queued && queue.len() == book.reservations().len()
}

pub fn check_out(book: &mut BookEntity, member_id: &str,
                 now: NaiveDateTime, due_at: NaiveDateTime) -> LibraryResult<()> {
    if book.book_status != BookStatus::Available {
        return Err(LibraryError::conflict(
            format!("book {} is not available", book.book_id).as_str(), vec![book.book_id.to_string()]));
    }
    if due_at <= now {
        return Err(LibraryError::validation("due date must be in the future", Some("400".to_string())));
    }
    book.book_status = BookStatus::CheckedOut;
    book.borrower_id = Some(member_id.to_string());
    book.checkout_at = Some(now);
    book.due_at = Some(due_at);
    book.reservations.retain(|m| m != member_id);
    book.updated_at = now;
    Ok(())
}

// Returns the member the book was handed to, if the queue was not empty.
pub fn return_book(book: &mut BookEntity, now: NaiveDateTime, loan_days: i64) -> LibraryResult<Option<String>> {
    if book.book_status != BookStatus::CheckedOut {
        return Err(LibraryError::invalid_state("book is not currently checked out"));
    }
    book.updated_at = now;
    if book.reservations.is_empty() {
        book.book_status = BookStatus::Available;
        book.borrower_id = None;
        book.checkout_at = None;
        book.due_at = None;
        return Ok(None);
    }
    let next = book.reservations.remove(0);
    book.borrower_id = Some(next.to_string());
    book.checkout_at = Some(now);
    book.due_at = Some(now + Duration::days(loan_days));
    Ok(Some(next))
}

pub fn reserve(book: &mut BookEntity, member_id: &str, now: NaiveDateTime) -> LibraryResult<()> {
    if book.book_status != BookStatus::CheckedOut {
        return Err(LibraryError::invalid_state("book is available; check it out instead"));
    }
    if book.borrower_id.as_deref() == Some(member_id) {
        return Err(LibraryError::duplicate_reservation(
            format!("member {} is the current borrower of book {}", member_id, book.book_id).as_str()));
    }
    if let Some(position) = book.reservations.iter().position(|m| m == member_id) {
        return Err(LibraryError::duplicate_reservation(
            format!("member {} is already in the reservation queue of book {} at position {}",
                    member_id, book.book_id, position + 1).as_str()));
    }
    book.reservations.push(member_id.to_string());
    book.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use crate::books::domain::model::BookEntity;
    use crate::core::library::{BookStatus, LibraryError};
    use crate::ledger::domain::rules::{check_out, is_consistent, is_overdue, reserve, return_book};

    fn book() -> BookEntity {
        BookEntity::new("Dune", "Frank Herbert", "9780441013593", "Sci-Fi")
    }

    #[tokio::test]
    async fn test_should_check_out_available_book() {
        let now = Utc::now().naive_utc();
        let mut book = book();
        check_out(&mut book, "m1", now, now + Duration::days(14)).expect("should check out");
        assert_eq!(BookStatus::CheckedOut, book.book_status);
        assert_eq!(Some("m1".to_string()), book.borrower_id);
        assert_eq!(Some(now), book.checkout_at);
        assert!(is_consistent(&book));

        let res = check_out(&mut book, "m2", now, now + Duration::days(14));
        assert!(matches!(res, Err(LibraryError::Conflict { ref book_ids, .. }) if book_ids == &vec![book.book_id.clone()]));
    }

    #[tokio::test]
    async fn test_should_reject_past_due_date() {
        let now = Utc::now().naive_utc();
        let mut book = book();
        assert!(matches!(check_out(&mut book, "m1", now, now), Err(LibraryError::Validation { .. })));
        assert!(matches!(check_out(&mut book, "m1", now, now - Duration::days(1)), Err(LibraryError::Validation { .. })));
        assert_eq!(BookStatus::Available, book.book_status);
    }

    #[tokio::test]
    async fn test_should_return_to_shelf_without_queue() {
        let now = Utc::now().naive_utc();
        let mut book = book();
        check_out(&mut book, "m1", now, now + Duration::days(14)).expect("should check out");
        assert_eq!(None, return_book(&mut book, now, 14).expect("should return"));
        assert_eq!(BookStatus::Available, book.book_status);
        assert_eq!(None, book.borrower_id);
        assert_eq!(None, book.checkout_at);
        assert_eq!(None, book.due_at);
        assert!(is_consistent(&book));

        let res = return_book(&mut book, now, 14);
        assert_eq!(Err(LibraryError::invalid_state("book is not currently checked out")), res);
    }

    #[tokio::test]
    async fn test_should_promote_queue_head_in_order() {
        let now = Utc::now().naive_utc();
        let mut book = book();
        check_out(&mut book, "m1", now, now + Duration::days(3)).expect("should check out");
        reserve(&mut book, "m2", now).expect("should reserve");
        reserve(&mut book, "m3", now).expect("should reserve");

        let later = now + Duration::days(2);
        assert_eq!(Some("m2".to_string()), return_book(&mut book, later, 14).expect("should return"));
        assert_eq!(BookStatus::CheckedOut, book.book_status);
        assert_eq!(Some("m2".to_string()), book.borrower_id);
        assert_eq!(Some(later), book.checkout_at);
        assert_eq!(Some(later + Duration::days(14)), book.due_at);
        assert_eq!(vec!["m3".to_string()], book.reservations);
        assert!(is_consistent(&book));

        assert_eq!(Some("m3".to_string()), return_book(&mut book, later, 14).expect("should return"));
        assert!(book.reservations.is_empty());
        assert_eq!(None, return_book(&mut book, later, 14).expect("should return"));
        assert_eq!(BookStatus::Available, book.book_status);
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_or_early_reservation() {
        let now = Utc::now().naive_utc();
        let mut book = book();
        let res = reserve(&mut book, "m2", now);
        assert_eq!(Err(LibraryError::invalid_state("book is available; check it out instead")), res);

        check_out(&mut book, "m1", now, now + Duration::days(14)).expect("should check out");
        assert!(matches!(reserve(&mut book, "m1", now), Err(LibraryError::DuplicateReservation { .. })));
        reserve(&mut book, "m2", now).expect("should reserve");
        assert!(matches!(reserve(&mut book, "m2", now), Err(LibraryError::DuplicateReservation { .. })));
        assert_eq!(vec!["m2".to_string()], book.reservations);
    }

    #[tokio::test]
    async fn test_should_derive_overdue() {
        let now = Utc::now().naive_utc();
        let mut book = book();
        assert!(!is_overdue(&book, now));
        check_out(&mut book, "m1", now, now + Duration::days(14)).expect("should check out");
        assert!(!is_overdue(&book, now + Duration::days(14)));
        assert!(is_overdue(&book, now + Duration::days(15)));
        assert_eq!(is_overdue(&book, now + Duration::days(15)), is_overdue(&book, now + Duration::days(15)));
    }

    #[tokio::test]
    async fn test_should_detect_inconsistent_books() {
        let now = Utc::now().naive_utc();
        let mut book = book();
        assert!(is_consistent(&book));
        book.borrower_id = Some("m1".to_string());
        assert!(!is_consistent(&book));

        let mut book = self::book();
        check_out(&mut book, "m1", now, now + Duration::days(14)).expect("should check out");
        book.reservations = vec!["m1".to_string()];
        assert!(!is_consistent(&book));
        book.reservations = vec!["m2".to_string(), "m2".to_string()];
        assert!(!is_consistent(&book));
    }
}
