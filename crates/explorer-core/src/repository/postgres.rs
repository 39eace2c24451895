use super::{
    BlockRow, DepositStats, DepositSummary, EpochHistoryRow, EpochRow, IndexRepository,
    RepositoryError, ValidatorStats,
};
use crate::config::DatabaseConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Row,
};
use tracing::info;

/// [`IndexRepository`] backed by the indexer's Postgres database.
///
/// Aggregates are cast to `BIGINT`/`DOUBLE PRECISION` in SQL so decoding does not depend on
/// the exact integer widths of the indexer schema.
#[derive(Debug, Clone)]
pub struct PgRepository {
    pool: PgPool,
}

/// Binds a `u64` as `BIGINT`, saturating values beyond `i64::MAX`.
fn bind_u64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

impl PgRepository {
    /// # Errors
    /// Returns `RepositoryError::Database` if the pool cannot connect.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;
        info!(max_connections = config.max_connections, "connected to indexer database");

        Ok(Self { pool })
    }

    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Extracts a non-nullable field from a database row.
    fn get_required<'r, T>(row: &'r PgRow, column: &'static str) -> Result<T, RepositoryError>
    where
        T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
    {
        row.try_get::<T, _>(column)
            .map_err(|e| RepositoryError::Decode { column, reason: e.to_string() })
    }

    /// Extracts a `BIGINT` column as `u64`, rejecting negative values.
    fn get_u64(row: &PgRow, column: &'static str) -> Result<u64, RepositoryError> {
        let value: i64 = Self::get_required(row, column)?;
        u64::try_from(value).map_err(|e| RepositoryError::Decode {
            column,
            reason: format!("value {value} out of u64 range: {e}"),
        })
    }

    async fn fetch_scalar(&self, sql: &'static str) -> Result<u64, RepositoryError> {
        let row = sqlx::query(sql).fetch_one(&self.pool).await?;
        Self::get_u64(&row, "value")
    }

    fn row_to_epoch(row: &PgRow) -> Result<EpochRow, RepositoryError> {
        Ok(EpochRow {
            epoch: Self::get_u64(row, "epoch")?,
            finalized: Self::get_required(row, "finalized")?,
            eligible_ether: Self::get_u64(row, "eligibleether")?,
            global_participation_rate: Self::get_required(row, "globalparticipationrate")?,
            voted_ether: Self::get_u64(row, "votedether")?,
        })
    }

    fn row_to_block(row: &PgRow) -> Result<BlockRow, RepositoryError> {
        Ok(BlockRow {
            epoch: Self::get_u64(row, "epoch")?,
            slot: Self::get_u64(row, "slot")?,
            proposer: Self::get_u64(row, "proposer")?,
            block_root: Self::get_required(row, "blockroot")?,
            parent_root: Self::get_required(row, "parentroot")?,
            attestations_count: Self::get_u64(row, "attestationscount")?,
            deposits_count: Self::get_u64(row, "depositscount")?,
            voluntary_exits_count: Self::get_u64(row, "voluntaryexitscount")?,
            proposer_slashings_count: Self::get_u64(row, "proposerslashingscount")?,
            attester_slashings_count: Self::get_u64(row, "attesterslashingscount")?,
            status: Self::get_required(row, "status")?,
            proposer_name: Self::get_required(row, "name")?,
        })
    }
}

#[async_trait]
impl IndexRepository for PgRepository {
    async fn latest_epoch(&self) -> Result<u64, RepositoryError> {
        self.fetch_scalar("SELECT COALESCE(MAX(epoch), 0)::BIGINT AS value FROM epochs").await
    }

    async fn latest_finalized_epoch(&self) -> Result<u64, RepositoryError> {
        self.fetch_scalar(
            "SELECT COALESCE(MAX(epoch), 0)::BIGINT AS value FROM epochs WHERE finalized IS TRUE",
        )
        .await
    }

    async fn latest_slot_before(&self, cutoff_slot: u64) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            "SELECT COALESCE(MAX(slot), 0)::BIGINT AS value FROM blocks WHERE slot < $1",
        )
        .bind(bind_u64(cutoff_slot))
        .fetch_one(&self.pool)
        .await?;
        Self::get_u64(&row, "value")
    }

    async fn latest_proposed_slot(&self) -> Result<u64, RepositoryError> {
        self.fetch_scalar(
            "SELECT COALESCE(MAX(slot), 0)::BIGINT AS value FROM blocks WHERE status = '1'",
        )
        .await
    }

    async fn valid_deposit_summary(&self) -> Result<DepositSummary, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*)::BIGINT AS total, MAX(block_ts) AS block_ts
            FROM eth1_deposits AS eth1
            WHERE eth1.amount >= 32e9 AND eth1.valid_signature = true
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        let block_ts: Option<NaiveDateTime> = Self::get_required(&row, "block_ts")?;

        Ok(DepositSummary {
            total: Self::get_u64(&row, "total")?,
            latest_block_ts: block_ts.map(|ts| DateTime::from_naive_utc_and_offset(ts, Utc)),
        })
    }

    async fn recent_epochs(&self, limit: u32) -> Result<Vec<EpochRow>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT epoch::BIGINT AS epoch, finalized,
                   eligibleether::BIGINT AS eligibleether,
                   globalparticipationrate::DOUBLE PRECISION AS globalparticipationrate,
                   votedether::BIGINT AS votedether
            FROM epochs
            ORDER BY epoch DESC
            LIMIT $1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_epoch).collect()
    }

    async fn scheduled_block_count(&self) -> Result<u64, RepositoryError> {
        self.fetch_scalar(
            r"
            SELECT COUNT(*)::BIGINT AS value
            FROM blocks
            WHERE status = '0' AND epoch = (SELECT MAX(epoch) FROM blocks)
            ",
        )
        .await
    }

    async fn recent_blocks(
        &self,
        cutoff_slot: u64,
        limit: u32,
    ) -> Result<Vec<BlockRow>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT
                blocks.epoch::BIGINT AS epoch,
                blocks.slot::BIGINT AS slot,
                blocks.proposer::BIGINT AS proposer,
                blocks.blockroot,
                blocks.parentroot,
                blocks.attestationscount::BIGINT AS attestationscount,
                blocks.depositscount::BIGINT AS depositscount,
                blocks.voluntaryexitscount::BIGINT AS voluntaryexitscount,
                blocks.proposerslashingscount::BIGINT AS proposerslashingscount,
                blocks.attesterslashingscount::BIGINT AS attesterslashingscount,
                blocks.status,
                COALESCE(validators.name, '') AS name
            FROM blocks
            LEFT JOIN validators ON blocks.proposer = validators.validatorindex
            WHERE blocks.slot < $1
            ORDER BY blocks.slot DESC
            LIMIT $2
            ",
        )
        .bind(bind_u64(cutoff_slot))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_block).collect()
    }

    async fn entering_validator_count(&self) -> Result<u64, RepositoryError> {
        self.fetch_scalar("SELECT COUNT(*)::BIGINT AS value FROM validatorqueue_activation").await
    }

    async fn exiting_validator_count(&self) -> Result<u64, RepositoryError> {
        self.fetch_scalar("SELECT COUNT(*)::BIGINT AS value FROM validatorqueue_exit").await
    }

    async fn average_balance(&self, epoch: u64) -> Result<u64, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT COALESCE(AVG(balance), 0)::DOUBLE PRECISION AS value
            FROM validator_balances
            WHERE epoch = $1
            ",
        )
        .bind(bind_u64(epoch))
        .fetch_one(&self.pool)
        .await?;

        let average: f64 = Self::get_required(&row, "value")?;
        // Truncates toward zero; negative or NaN averages clamp to 0.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let average = average as u64;
        Ok(average)
    }

    async fn epoch_history(
        &self,
        before_epoch: u64,
    ) -> Result<Vec<EpochHistoryRow>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT epoch::BIGINT AS epoch,
                   eligibleether::BIGINT AS eligibleether,
                   validatorscount::BIGINT AS validatorscount,
                   finalized
            FROM epochs
            WHERE epoch < $1
            ORDER BY epoch
            ",
        )
        .bind(bind_u64(before_epoch))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(EpochHistoryRow {
                    epoch: Self::get_u64(row, "epoch")?,
                    eligible_ether: Self::get_u64(row, "eligibleether")?,
                    validators_count: Self::get_u64(row, "validatorscount")?,
                    finalized: Self::get_required(row, "finalized")?,
                })
            })
            .collect()
    }

    async fn participation_history(&self) -> Result<Vec<EpochRow>, RepositoryError> {
        let rows = sqlx::query(
            r"
            SELECT epoch::BIGINT AS epoch, finalized,
                   eligibleether::BIGINT AS eligibleether,
                   globalparticipationrate::DOUBLE PRECISION AS globalparticipationrate,
                   votedether::BIGINT AS votedether
            FROM epochs
            ORDER BY epoch
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_epoch).collect()
    }

    async fn validator_stats(&self, epoch: u64) -> Result<ValidatorStats, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT
                COUNT(*)::BIGINT AS total,
                (COUNT(*) FILTER (WHERE activationepoch <= $1 AND exitepoch > $1))::BIGINT
                    AS active,
                (COUNT(*) FILTER (WHERE activationepoch > $1))::BIGINT AS pending,
                (COUNT(*) FILTER (WHERE exitepoch <= $1))::BIGINT AS exited
            FROM validators
            ",
        )
        .bind(bind_u64(epoch))
        .fetch_one(&self.pool)
        .await?;

        Ok(ValidatorStats {
            total: Self::get_u64(&row, "total")?,
            active: Self::get_u64(&row, "active")?,
            pending: Self::get_u64(&row, "pending")?,
            exited: Self::get_u64(&row, "exited")?,
        })
    }

    async fn deposit_stats(&self) -> Result<DepositStats, RepositoryError> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*)::BIGINT AS count, COALESCE(SUM(amount), 0)::BIGINT AS total_amount
            FROM eth1_deposits
            WHERE valid_signature = true
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DepositStats {
            count: Self::get_u64(&row, "count")?,
            total_amount_gwei: Self::get_u64(&row, "total_amount")?,
        })
    }
}
