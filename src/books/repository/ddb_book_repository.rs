use std::cmp;
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use chrono::Utc;

use crate::books::domain::model::BookEntity;
use crate::books::repository::BookRepository;
use crate::core::library::{BookStatus, LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::utils::ddb::{add_filter_expr, create_error, delete_error, from_ddb, opt_string, opt_string_date, parse_date_attribute, parse_item, parse_number_attribute, parse_opt_string_attribute, parse_string_attribute, parse_string_list_attribute, string_date, string_list, to_ddb_page, update_error};

#[derive(Debug)]
pub struct DDBBookRepository {
    client: Client,
    table_name: String,
    index_name: String,
}

impl DDBBookRepository {
    pub(crate) fn new(client: Client, table_name: &str, index_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
            index_name: index_name.to_string(),
        }
    }
}

#[async_trait]
impl Repository<BookEntity> for DDBBookRepository {
    async fn create(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        let val = serde_json::to_value(entity)?;
        self.client
            .put_item()
            .table_name(table_name)
            .condition_expression("attribute_not_exists(book_id)")
            .set_item(Some(parse_item(val)?))
            .send()
            .await.map(|_| 1).map_err(|err| create_error(entity.book_id.as_str(), err))
    }

    async fn update(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();

        self.client
            .update_item()
            .table_name(table_name)
            .key("book_id", AttributeValue::S(entity.book_id.clone()))
            .update_expression("SET version = :version, title = :title, author = :author, isbn = :isbn, genre = :genre, cover_image = :cover_image, book_status = :book_status, borrower_id = :borrower_id, checkout_at = :checkout_at, due_at = :due_at, reservations = :reservations, updated_at = :updated_at")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .expression_attribute_values(":version", AttributeValue::N((entity.version + 1).to_string()))
            .expression_attribute_values(":title", AttributeValue::S(entity.title.to_string()))
            .expression_attribute_values(":author", AttributeValue::S(entity.author.to_string()))
            .expression_attribute_values(":isbn", AttributeValue::S(entity.isbn.to_string()))
            .expression_attribute_values(":genre", AttributeValue::S(entity.genre.to_string()))
            .expression_attribute_values(":cover_image", opt_string(&entity.cover_image))
            .expression_attribute_values(":book_status", AttributeValue::S(entity.book_status.to_string()))
            .expression_attribute_values(":borrower_id", opt_string(&entity.borrower_id))
            .expression_attribute_values(":checkout_at", opt_string_date(entity.checkout_at))
            .expression_attribute_values(":due_at", opt_string_date(entity.due_at))
            .expression_attribute_values(":reservations", string_list(&entity.reservations))
            .expression_attribute_values(":updated_at", string_date(entity.updated_at))
            .condition_expression("attribute_exists(version) AND version = :old_version")
            .send()
            .await.map(|_| 1).map_err(|err| update_error(entity.book_id.as_str(), err))
    }

    async fn get(&self, id: &str) -> LibraryResult<BookEntity> {
        let table_name: &str = self.table_name.as_ref();
        self.client
            .query()
            .table_name(table_name)
            .limit(2)
            .consistent_read(true)
            .key_condition_expression(
                "book_id = :book_id",
            )
            .expression_attribute_values(
                ":book_id",
                AttributeValue::S(id.to_string()),
            )
            .send()
            .await.map_err(LibraryError::from).and_then(|req| {
            if let Some(items) = req.items {
                if items.len() > 1 {
                    return Err(LibraryError::database(format!("too many books for {}", id).as_str(), None, false));
                } else if !items.is_empty() {
                    if let Some(map) = items.first() {
                        return Ok(map_to_book(map));
                    }
                }
                Err(LibraryError::not_found(format!("book item not found for {}", id).as_str()))
            } else {
                Err(LibraryError::not_found(format!("book not found for {}", id).as_str()))
            }
        })
    }

    // a missing item is not an error; a newer version is
    async fn delete(&self, entity: &BookEntity) -> LibraryResult<usize> {
        let table_name: &str = self.table_name.as_ref();
        self.client.delete_item()
            .table_name(table_name)
            .key("book_id", AttributeValue::S(entity.book_id.clone()))
            .condition_expression("attribute_not_exists(book_id) OR version = :old_version")
            .expression_attribute_values(":old_version", AttributeValue::N(entity.version.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map(|out| out.attributes().map_or(0, |_| 1))
            .map_err(|err| delete_error(entity.book_id.as_str(), err))
    }

    // Note you cannot use certain reserved words per https://docs.aws.amazon.com/amazondynamodb/latest/developerguide/ReservedWords.html
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let index_name: &str = self.index_name.as_ref();
        let exclusive_start_key = to_ddb_page(page, predicate);
        let mut request = self.client
            .query()
            .table_name(table_name)
            .index_name(index_name)
            .limit(cmp::min(page_size, 500) as i32)
            .consistent_read(false)
            .set_exclusive_start_key(exclusive_start_key)
            .expression_attribute_values(":status", AttributeValue::S(
                predicate.get("book_status").unwrap_or(&BookStatus::Available.to_string()).to_string()
            ));
        // handle GSI keys first
        let mut key_cond = String::new();
        key_cond.push_str("book_status = :status");

        if let Some(isbn) = predicate.get("isbn") {
            key_cond.push_str(" AND isbn = :isbn");
            request = request.expression_attribute_values(":isbn", AttributeValue::S(isbn.to_string()));
        }
        request = request.key_condition_expression(key_cond);
        let mut filter_expr = String::new();
        // then handle other filters
        for (k, v) in predicate {
            if k != "book_status" && k != "isbn" {
                let ks = add_filter_expr(k.as_str(), &mut filter_expr);
                request = request.expression_attribute_values(format!(":{}", ks).as_str(), AttributeValue::S(v.to_string()));
            }
        }
        if !filter_expr.is_empty() {
            request = request.filter_expression(filter_expr);
        }

        request
            .send()
            .await.map_err(LibraryError::from).map(|req| {
            let records = req.items.as_ref().unwrap_or(&vec![]).iter()
                .map(map_to_book).collect();
            from_ddb(page, page_size, req.last_evaluated_key(), records)
        })
    }

    async fn scan(&self, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<BookEntity>> {
        let table_name: &str = self.table_name.as_ref();
        let exclusive_start_key = to_ddb_page(page, &HashMap::new());
        self.client
            .scan()
            .table_name(table_name)
            .consistent_read(true)
            .set_exclusive_start_key(exclusive_start_key)
            .limit(cmp::min(page_size, 500) as i32)
            .send()
            .await.map_err(LibraryError::from).map(|req| {
            let def_items = vec![];
            let items = req.items.as_ref().unwrap_or(&def_items);
            let records = items.iter().map(map_to_book).collect();
            from_ddb(page, page_size, req.last_evaluated_key(), records)
        })
    }
}

#[async_trait]
impl BookRepository for DDBBookRepository {
    // isbn is the sort key of the status index, so every status partition is asked in turn
    async fn find_by_isbn(&self, isbn: &str) -> LibraryResult<Vec<BookEntity>> {
        let mut books = vec![];
        for status in [BookStatus::Available, BookStatus::CheckedOut] {
            let predicate = HashMap::from([
                ("book_status".to_string(), status.to_string()),
                ("isbn".to_string(), isbn.to_string()),
            ]);
            let res = self.query(&predicate, None, 500).await?;
            books.extend(res.records);
        }
        Ok(books)
    }
}

fn map_to_book(map: &HashMap<String, AttributeValue>) -> BookEntity {
    BookEntity {
        book_id: parse_string_attribute("book_id", map).unwrap_or_default(),
        version: parse_number_attribute("version", map),
        title: parse_string_attribute("title", map).unwrap_or_default(),
        author: parse_string_attribute("author", map).unwrap_or_default(),
        isbn: parse_string_attribute("isbn", map).unwrap_or_default(),
        genre: parse_string_attribute("genre", map).unwrap_or_default(),
        cover_image: parse_opt_string_attribute("cover_image", map),
        book_status: BookStatus::from(parse_string_attribute("book_status", map).unwrap_or_default()),
        borrower_id: parse_opt_string_attribute("borrower_id", map),
        checkout_at: parse_date_attribute("checkout_at", map),
        due_at: parse_date_attribute("due_at", map),
        reservations: parse_string_list_attribute("reservations", map),
        created_at: parse_date_attribute("created_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
        updated_at: parse_date_attribute("updated_at", map).unwrap_or_else(|| Utc::now().naive_utc()),
    }
}

// These run against DynamoDB local, e.g. `docker run -p 8000:8000 amazon/dynamodb-local`.
#[cfg(test)]
mod tests {
    use async_once::AsyncOnce;
    use aws_sdk_dynamodb::Client;
    use chrono::{Duration, Utc};
    use lazy_static::lazy_static;

    use crate::books::domain::model::BookEntity;
    use crate::books::repository::BookRepository;
    use crate::books::repository::ddb_book_repository::DDBBookRepository;
    use crate::core::library::{BookStatus, LibraryError};
    use crate::core::repository::{Repository, RepositoryStore};
    use crate::utils::ddb::{build_db_client, create_table, delete_table};

    lazy_static! {
        static ref CLIENT: AsyncOnce<Client> = AsyncOnce::new(async {
                let client = build_db_client(RepositoryStore::LocalDynamoDB).await;
                let _ = delete_table(&client, "books").await;
                let _ = create_table(&client, "books", "book_id", "book_status", "isbn").await;
                client
            });
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB local"]
    async fn test_should_create_get_books() {
        let books_repo = DDBBookRepository::new(CLIENT.get().await.clone(), "books", "books_ndx");
        let book = BookEntity::new("Dune", "Frank Herbert", "9780441013593", "Sci-Fi");
        let size = books_repo.create(&book).await.expect("should create book");
        assert_eq!(1, size);
        assert!(matches!(books_repo.create(&book).await, Err(LibraryError::DuplicateKey { .. })));

        let loaded = books_repo.get(book.book_id.as_str()).await.expect("should return book");
        assert_eq!(book.book_id, loaded.book_id);
        assert_eq!(book.created_at, loaded.created_at);
        assert_eq!(None, loaded.borrower_id);
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB local"]
    async fn test_should_update_lending_state() {
        let books_repo = DDBBookRepository::new(CLIENT.get().await.clone(), "books", "books_ndx");
        let mut book = BookEntity::new("1984", "George Orwell", "9780451524935", "Dystopian");
        books_repo.create(&book).await.expect("should create book");

        let now = Utc::now().naive_utc();
        book.book_status = BookStatus::CheckedOut;
        book.borrower_id = Some("m1".to_string());
        book.checkout_at = Some(now);
        book.due_at = Some(now + Duration::days(14));
        book.reservations = vec!["m2".to_string(), "m3".to_string()];
        let size = books_repo.update(&book).await.expect("should update book");
        assert_eq!(1, size);

        let loaded = books_repo.get(book.book_id.as_str()).await.expect("should return book");
        assert_eq!(BookStatus::CheckedOut, loaded.book_status);
        assert_eq!(Some("m1".to_string()), loaded.borrower_id);
        assert_eq!(book.due_at, loaded.due_at);
        assert_eq!(book.reservations, loaded.reservations);
        assert_eq!(1, loaded.version);

        // book still carries version 0
        let res = books_repo.update(&book).await;
        assert!(matches!(res, Err(LibraryError::Conflict { .. })));
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB local"]
    async fn test_should_scan_and_find_books() {
        let books_repo = DDBBookRepository::new(CLIENT.get().await.clone(), "books", "books_ndx");
        for _i in 0..5 {
            let book = BookEntity::new("The Hobbit", "J.R.R. Tolkien", "9780345339683", "Fantasy");
            books_repo.create(&book).await.expect("should create book");
        }
        let res = books_repo.scan(None, 3).await.expect("should scan books");
        assert_eq!(3, res.records.len());
        let found = books_repo.find_by_isbn("9780345339683").await.expect("should find books");
        assert_eq!(5, found.len());
    }

    #[tokio::test]
    #[ignore = "requires DynamoDB local"]
    async fn test_should_create_delete_books() {
        let books_repo = DDBBookRepository::new(CLIENT.get().await.clone(), "books", "books_ndx");
        let book = BookEntity::new("Dune", "Frank Herbert", "9780441013593", "Sci-Fi");
        books_repo.create(&book).await.expect("should create book");

        let mut lent = book.clone();
        lent.book_status = BookStatus::CheckedOut;
        lent.borrower_id = Some("m1".to_string());
        books_repo.update(&lent).await.expect("should lend book");
        // book still carries version 0
        let res = books_repo.delete(&book).await;
        assert!(matches!(res, Err(LibraryError::Conflict { .. })));

        lent.version = 1;
        let deleted = books_repo.delete(&lent).await.expect("should delete book");
        assert_eq!(1, deleted);
        assert_eq!(0, books_repo.delete(&lent).await.expect("should ignore missing book"));

        let loaded = books_repo.get(book.book_id.as_str()).await;
        assert!(loaded.is_err());
    }
}
