//! Transaction repository: idempotency lookup and history read paths.
//!
//! The read paths here are projections over committed transactions; they
//! never write. The only writer of transaction rows is the transfer
//! coordinator.

use futures::Stream;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use tally_core::history::{Direction, HistoryFilter, SortField, SortOrder};
use tally_shared::types::PageRequest;

use crate::entities::transactions;

/// One page of transaction history plus the total match count.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    /// The transactions in this page.
    pub entries: Vec<transactions::Model>,
    /// Total number of matching transactions across all pages.
    pub total: u64,
}

/// Transaction repository for lookups and history queries.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find_by_id(transaction_id)
            .one(&self.db)
            .await
    }

    /// Looks up a transaction by its idempotency key.
    ///
    /// The key is uniquely indexed, so at most one row can match.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_idempotency_key(
        &self,
        key: &str,
    ) -> Result<Option<transactions::Model>, DbErr> {
        transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key))
            .one(&self.db)
            .await
    }

    /// Queries a user's transaction history with filters, sorting, and
    /// pagination. `owned` is the set of account IDs belonging to the
    /// requesting user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn history(
        &self,
        owned: &[Uuid],
        filter: &HistoryFilter,
        page: &PageRequest,
        sort_field: SortField,
        sort_order: SortOrder,
    ) -> Result<HistoryPage, DbErr> {
        let condition = filter_condition(owned, filter);

        let total = transactions::Entity::find()
            .filter(condition.clone())
            .count(&self.db)
            .await?;

        let entries = transactions::Entity::find()
            .filter(condition)
            .order_by(order_column(sort_field), order_direction(sort_order))
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(HistoryPage { entries, total })
    }

    /// Streams a user's filtered transaction history row by row.
    ///
    /// Rows are fetched in bounded batches and yielded one at a time, so
    /// the full result set is never materialized in memory regardless of
    /// its size.
    pub fn export_stream(
        &self,
        owned: Vec<Uuid>,
        filter: &HistoryFilter,
        sort_field: SortField,
        sort_order: SortOrder,
    ) -> impl Stream<Item = Result<transactions::Model, DbErr>> + Send + 'static {
        let condition = filter_condition(&owned, filter);
        let column = order_column(sort_field);
        let order = order_direction(sort_order);
        let db = self.db.clone();

        futures::stream::try_unfold(
            (db, condition, 0u64, Vec::new().into_iter()),
            move |(db, condition, offset, mut buffered): (
                sea_orm::DatabaseConnection,
                Condition,
                u64,
                std::vec::IntoIter<transactions::Model>,
            )| {
                let order = order.clone();
                async move {
                    if let Some(row) = buffered.next() {
                        return Ok(Some((row, (db, condition, offset, buffered))));
                    }

                    let rows = transactions::Entity::find()
                        .filter(condition.clone())
                        .order_by(column, order)
                        .offset(offset)
                        .limit(EXPORT_BATCH)
                        .all(&db)
                        .await?;

                    let fetched = rows.len() as u64;
                    let mut rows = rows.into_iter();
                    match rows.next() {
                        Some(first) => {
                            Ok(Some((first, (db, condition, offset + fetched, rows))))
                        }
                        None => Ok(None),
                    }
                }
            },
        )
    }
}

/// Batch size for the export stream.
const EXPORT_BATCH: u64 = 500;

/// Builds the ownership/direction condition: without a direction, any
/// transaction touching an owned account matches; with one, only the
/// matching side does.
fn owner_condition(owned: &[Uuid], direction: Option<Direction>) -> Condition {
    let from_owned = transactions::Column::FromAccount.is_in(owned.to_vec());
    let to_owned = transactions::Column::ToAccount.is_in(owned.to_vec());

    match direction {
        Some(Direction::Outgoing) => Condition::all().add(from_owned),
        Some(Direction::Incoming) => Condition::all().add(to_owned),
        None => Condition::any().add(from_owned).add(to_owned),
    }
}

/// Builds the full filter condition for a history query.
fn filter_condition(owned: &[Uuid], filter: &HistoryFilter) -> Condition {
    let mut condition = Condition::all().add(owner_condition(owned, filter.direction));

    if let Some(date_from) = filter.date_from {
        condition = condition.add(transactions::Column::CreatedAt.gte(date_from));
    }
    if let Some(date_to) = filter.date_to {
        condition = condition.add(transactions::Column::CreatedAt.lte(date_to));
    }
    if let Some(min_amount) = filter.min_amount {
        condition = condition.add(transactions::Column::Amount.gte(min_amount));
    }
    if let Some(max_amount) = filter.max_amount {
        condition = condition.add(transactions::Column::Amount.lte(max_amount));
    }
    if let Some(status) = filter.status {
        let status: crate::entities::sea_orm_active_enums::TransactionStatus = status.into();
        condition = condition.add(transactions::Column::Status.eq(status));
    }

    condition
}

/// Maps an allow-listed sort field to its column.
const fn order_column(field: SortField) -> transactions::Column {
    match field {
        SortField::CreatedAt => transactions::Column::CreatedAt,
        SortField::UpdatedAt => transactions::Column::UpdatedAt,
        SortField::Amount => transactions::Column::Amount,
        SortField::Status => transactions::Column::Status,
    }
}

const fn order_direction(order: SortOrder) -> Order {
    match order {
        SortOrder::Asc => Order::Asc,
        SortOrder::Desc => Order::Desc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_column_mapping() {
        assert!(matches!(
            order_column(SortField::CreatedAt),
            transactions::Column::CreatedAt
        ));
        assert!(matches!(
            order_column(SortField::UpdatedAt),
            transactions::Column::UpdatedAt
        ));
        assert!(matches!(
            order_column(SortField::Amount),
            transactions::Column::Amount
        ));
        assert!(matches!(
            order_column(SortField::Status),
            transactions::Column::Status
        ));
    }

    #[test]
    fn test_order_direction_mapping() {
        assert!(matches!(order_direction(SortOrder::Asc), Order::Asc));
        assert!(matches!(order_direction(SortOrder::Desc), Order::Desc));
    }

    #[test]
    fn test_directional_conditions_differ() {
        let owned = vec![Uuid::new_v4()];

        let any = owner_condition(&owned, None);
        let outgoing = owner_condition(&owned, Some(Direction::Outgoing));
        let incoming = owner_condition(&owned, Some(Direction::Incoming));

        // The three shapes must be distinct conditions.
        assert_ne!(format!("{any:?}"), format!("{outgoing:?}"));
        assert_ne!(format!("{outgoing:?}"), format!("{incoming:?}"));
    }

    #[test]
    fn test_filter_condition_includes_ranges() {
        let owned = vec![Uuid::new_v4()];
        let filter = HistoryFilter {
            date_from: Some(Utc::now()),
            date_to: Some(Utc::now()),
            min_amount: Some(dec!(10)),
            max_amount: Some(dec!(100)),
            direction: None,
            status: Some(tally_core::transfer::TransactionStatus::Completed),
        };

        let with_ranges = format!("{:?}", filter_condition(&owned, &filter));
        let without = format!("{:?}", filter_condition(&owned, &HistoryFilter::default()));
        assert_ne!(with_ranges, without);
    }
}
