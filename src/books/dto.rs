use chrono::{NaiveDateTime, Utc};
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use crate::books::domain::Book;
use crate::core::domain::Identifiable;
use crate::core::library::BookStatus;
use crate::utils::date::{opt_serializer, serializer};

// BookDto is a data transfer object for the catalog and ledger services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDto {
    pub book_id: String,
    pub version: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub genre: String,
    pub cover_image: Option<String>,
    pub book_status: BookStatus,
    pub borrower_id: Option<String>,
    #[serde(with = "opt_serializer", default)]
    pub checkout_at: Option<NaiveDateTime>,
    #[serde(with = "opt_serializer", default)]
    pub due_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reservations: Vec<String>,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
    #[serde(with = "serializer")]
    pub updated_at: NaiveDateTime,
}

impl BookDto {
    pub fn new(title: &str, author: &str, isbn: &str, genre: &str) -> BookDto {
        let now = Utc::now().naive_utc();
        BookDto {
            book_id: Uuid::new_v4().to_string(),
            version: 0,
            title: title.to_string(),
            author: author.to_string(),
            isbn: isbn.to_string(),
            genre: genre.to_string(),
            cover_image: None,
            book_status: BookStatus::Available,
            borrower_id: None,
            checkout_at: None,
            due_at: None,
            reservations: vec![],
            created_at: now,
            updated_at: now,
        }
    }
}

impl Identifiable for BookDto {
    fn id(&self) -> String {
        self.book_id.to_string()
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn set_version(&mut self, version: i64) {
        self.version = version;
    }
}

impl Book for BookDto {
    fn status(&self) -> BookStatus {
        self.book_status
    }

    fn borrower_id(&self) -> Option<&str> {
        self.borrower_id.as_deref()
    }

    fn checkout_at(&self) -> Option<NaiveDateTime> {
        self.checkout_at
    }

    fn due_at(&self) -> Option<NaiveDateTime> {
        self.due_at
    }

    fn reservations(&self) -> &[String] {
        &self.reservations
    }
}

#[cfg(test)]
mod tests {
    use crate::books::domain::Book;
    use crate::books::dto::BookDto;
    use crate::core::library::BookStatus;

    #[tokio::test]
    async fn test_should_build_books() {
        let book = BookDto::new("1984", "George Orwell", "9780451524935", "Dystopian");
        assert_eq!("George Orwell", book.author.as_str());
        assert_eq!(BookStatus::Available, book.status());
        assert_eq!(None, book.borrower_id());
        assert!(book.reservations().is_empty());
    }
}
