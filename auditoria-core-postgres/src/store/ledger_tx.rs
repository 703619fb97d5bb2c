use async_trait::async_trait;
use auditoria_core_api::domain::{split_hours_deduction, HoursSplit};
use auditoria_core_db::models::{
    AuditRequestModel, CommissionModel, CompanyModel, ConsultationCategoryModel,
    ConsultationRequestModel, DocumentRequestModel, DocumentRequestStatus, PartnerModel,
};
use auditoria_core_db::repository::{LedgerTx, StoreResult};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::utils::{get_heapless_string, get_optional_heapless_string, TryFromRow};

/// One open PostgreSQL transaction. All statements run on the wrapped
/// `sqlx::Transaction`; dropping without commit rolls back.
pub struct PgLedgerTx {
    tx: Transaction<'static, Postgres>,
}

impl PgLedgerTx {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

impl TryFromRow<PgRow> for PartnerModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(PartnerModel {
            id: row.try_get("id")?,
            name: get_heapless_string(row, "name")?,
            commission_rate: row.try_get("commission_rate")?,
            total_commissions: row.try_get("total_commissions")?,
            pending_commissions: row.try_get("pending_commissions")?,
            hours_balance: row.try_get("hours_balance")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFromRow<PgRow> for CompanyModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(CompanyModel {
            id: row.try_get("id")?,
            name: get_heapless_string(row, "name")?,
            tax_id: get_optional_heapless_string(row, "tax_id")?,
            referring_partner_id: row.try_get("referring_partner_id")?,
        })
    }
}

impl TryFromRow<PgRow> for CommissionModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(CommissionModel {
            id: row.try_get("id")?,
            partner_id: row.try_get("partner_id")?,
            audit_request_id: row.try_get("audit_request_id")?,
            base_amount: row.try_get("base_amount")?,
            rate_percent: row.try_get("rate_percent")?,
            amount: row.try_get("amount")?,
            status: row.try_get("status")?,
            payment_reference: get_optional_heapless_string(row, "payment_reference")?,
            created_at: row.try_get("created_at")?,
            paid_at: row.try_get("paid_at")?,
        })
    }
}

impl TryFromRow<PgRow> for ConsultationCategoryModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(ConsultationCategoryModel {
            id: row.try_get("id")?,
            name: get_heapless_string(row, "name")?,
            hours: row.try_get("hours")?,
            is_custom: row.try_get("is_custom")?,
        })
    }
}

#[async_trait]
impl LedgerTx for PgLedgerTx {
    async fn find_audit_request(&mut self, id: Uuid) -> StoreResult<Option<AuditRequestModel>> {
        let found = sqlx::query_as::<_, AuditRequestModel>(
            "SELECT * FROM audit_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(found)
    }

    async fn create_audit_request(&mut self, item: &AuditRequestModel) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_requests (
                id, company_id, referring_partner_id, service_type, fiscal_year,
                urgent, status, quoted_amount, quote_notes, quote_valid_until,
                requested_at, quoted_at, decided_at, started_at, finished_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(item.id)
        .bind(item.company_id)
        .bind(item.referring_partner_id)
        .bind(item.service_type)
        .bind(item.fiscal_year)
        .bind(item.urgent)
        .bind(item.status)
        .bind(item.quoted_amount)
        .bind(item.quote_notes.as_deref())
        .bind(item.quote_valid_until)
        .bind(item.requested_at)
        .bind(item.quoted_at)
        .bind(item.decided_at)
        .bind(item.started_at)
        .bind(item.finished_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_audit_request(&mut self, item: &AuditRequestModel) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE audit_requests
            SET status = $2, quoted_amount = $3, quote_notes = $4,
                quote_valid_until = $5, quoted_at = $6, decided_at = $7,
                started_at = $8, finished_at = $9
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(item.status)
        .bind(item.quoted_amount)
        .bind(item.quote_notes.as_deref())
        .bind(item.quote_valid_until)
        .bind(item.quoted_at)
        .bind(item.decided_at)
        .bind(item.started_at)
        .bind(item.finished_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(format!("audit request {} does not exist", item.id).into());
        }
        Ok(())
    }

    async fn count_open_document_requests(&mut self, audit_request_id: Uuid) -> StoreResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS open FROM document_requests \
             WHERE audit_request_id = $1 AND (status = $2 OR status = $3)",
        )
        .bind(audit_request_id)
        .bind(DocumentRequestStatus::Pending)
        .bind(DocumentRequestStatus::Submitted)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row.try_get("open")?)
    }

    async fn create_document_request(&mut self, item: &DocumentRequestModel) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO document_requests (id, audit_request_id, title, status, requested_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(item.id)
        .bind(item.audit_request_id)
        .bind(item.title.as_str())
        .bind(item.status)
        .bind(item.requested_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_document_request(&mut self, item: &DocumentRequestModel) -> StoreResult<()> {
        let result = sqlx::query("UPDATE document_requests SET status = $2 WHERE id = $1")
            .bind(item.id)
            .bind(item.status)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(format!("document request {} does not exist", item.id).into());
        }
        Ok(())
    }

    async fn find_commission(&mut self, id: Uuid) -> StoreResult<Option<CommissionModel>> {
        let row = sqlx::query("SELECT * FROM commissions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| CommissionModel::try_from_row(&r)).transpose()
    }

    async fn find_commission_by_audit_request(
        &mut self,
        audit_request_id: Uuid,
    ) -> StoreResult<Option<CommissionModel>> {
        let row = sqlx::query("SELECT * FROM commissions WHERE audit_request_id = $1 FOR UPDATE")
            .bind(audit_request_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| CommissionModel::try_from_row(&r)).transpose()
    }

    async fn create_commission(&mut self, item: &CommissionModel) -> StoreResult<()> {
        // commissions.audit_request_id carries a unique constraint; the
        // database is the last line of defense for the one-commission-per-
        // request invariant.
        sqlx::query(
            r#"
            INSERT INTO commissions (
                id, partner_id, audit_request_id, base_amount, rate_percent,
                amount, status, payment_reference, created_at, paid_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(item.partner_id)
        .bind(item.audit_request_id)
        .bind(item.base_amount)
        .bind(item.rate_percent)
        .bind(item.amount)
        .bind(item.status)
        .bind(item.payment_reference.as_ref().map(|s| s.as_str()))
        .bind(item.created_at)
        .bind(item.paid_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_commission(&mut self, item: &CommissionModel) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE commissions SET status = $2, payment_reference = $3, paid_at = $4 \
             WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.status)
        .bind(item.payment_reference.as_ref().map(|s| s.as_str()))
        .bind(item.paid_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(format!("commission {} does not exist", item.id).into());
        }
        Ok(())
    }

    async fn find_partner(&mut self, id: Uuid) -> StoreResult<Option<PartnerModel>> {
        let row = sqlx::query("SELECT * FROM partners WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| PartnerModel::try_from_row(&r)).transpose()
    }

    async fn create_partner(&mut self, item: &PartnerModel) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO partners (
                id, name, commission_rate, total_commissions, pending_commissions,
                hours_balance, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(item.name.as_str())
        .bind(item.commission_rate)
        .bind(item.total_commissions)
        .bind(item.pending_commissions)
        .bind(item.hours_balance)
        .bind(item.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_partner(&mut self, item: &PartnerModel) -> StoreResult<()> {
        // Counters are deliberately absent here; they only move through the
        // atomic increment statements below.
        let result = sqlx::query(
            "UPDATE partners SET name = $2, commission_rate = $3 WHERE id = $1",
        )
        .bind(item.id)
        .bind(item.name.as_str())
        .bind(item.commission_rate)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(format!("partner {} does not exist", item.id).into());
        }
        Ok(())
    }

    async fn find_company(&mut self, id: Uuid) -> StoreResult<Option<CompanyModel>> {
        let row = sqlx::query("SELECT * FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| CompanyModel::try_from_row(&r)).transpose()
    }

    async fn create_company(&mut self, item: &CompanyModel) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO companies (id, name, tax_id, referring_partner_id) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(item.id)
        .bind(item.name.as_str())
        .bind(item.tax_id.as_ref().map(|s| s.as_str()))
        .bind(item.referring_partner_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn apply_commission_accrual(
        &mut self,
        partner_id: Uuid,
        amount: Decimal,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE partners \
             SET total_commissions = total_commissions + $2, \
                 pending_commissions = pending_commissions + $2 \
             WHERE id = $1",
        )
        .bind(partner_id)
        .bind(amount)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(format!("partner {partner_id} does not exist").into());
        }
        Ok(())
    }

    async fn apply_commission_settlement(
        &mut self,
        partner_id: Uuid,
        amount: Decimal,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE partners SET pending_commissions = pending_commissions - $2 WHERE id = $1",
        )
        .bind(partner_id)
        .bind(amount)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(format!("partner {partner_id} does not exist").into());
        }
        Ok(())
    }

    async fn deduct_hours_up_to(
        &mut self,
        partner_id: Uuid,
        requested: Decimal,
    ) -> StoreResult<HoursSplit> {
        // Single statement: lock the row, capture the prior balance and apply
        // the capped deduction, so no read-modify-write spans two calls.
        let row = sqlx::query(
            r#"
            WITH locked AS (
                SELECT id, hours_balance AS before_balance
                FROM partners
                WHERE id = $1
                FOR UPDATE
            )
            UPDATE partners p
            SET hours_balance = p.hours_balance - LEAST(GREATEST(l.before_balance, 0), $2)
            FROM locked l
            WHERE p.id = l.id
            RETURNING l.before_balance
            "#,
        )
        .bind(partner_id)
        .bind(requested)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or_else(|| format!("partner {partner_id} does not exist"))?;

        let before: Decimal = row.try_get("before_balance")?;
        Ok(split_hours_deduction(before, requested))
    }

    async fn find_consultation(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<ConsultationRequestModel>> {
        let found = sqlx::query_as::<_, ConsultationRequestModel>(
            "SELECT * FROM consultation_requests WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(found)
    }

    async fn create_consultation(&mut self, item: &ConsultationRequestModel) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO consultation_requests (
                id, partner_id, title, description, urgent, status, category_id,
                assigned_hours, requested_at, quoted_at, accepted_at, started_at,
                finished_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(item.id)
        .bind(item.partner_id)
        .bind(item.title.as_str())
        .bind(item.description.as_deref())
        .bind(item.urgent)
        .bind(item.status)
        .bind(item.category_id)
        .bind(item.assigned_hours)
        .bind(item.requested_at)
        .bind(item.quoted_at)
        .bind(item.accepted_at)
        .bind(item.started_at)
        .bind(item.finished_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn update_consultation(&mut self, item: &ConsultationRequestModel) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE consultation_requests
            SET status = $2, category_id = $3, assigned_hours = $4, quoted_at = $5,
                accepted_at = $6, started_at = $7, finished_at = $8
            WHERE id = $1
            "#,
        )
        .bind(item.id)
        .bind(item.status)
        .bind(item.category_id)
        .bind(item.assigned_hours)
        .bind(item.quoted_at)
        .bind(item.accepted_at)
        .bind(item.started_at)
        .bind(item.finished_at)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(format!("consultation request {} does not exist", item.id).into());
        }
        Ok(())
    }

    async fn find_consultation_category(
        &mut self,
        id: Uuid,
    ) -> StoreResult<Option<ConsultationCategoryModel>> {
        let row = sqlx::query("SELECT * FROM consultation_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| ConsultationCategoryModel::try_from_row(&r))
            .transpose()
    }

    async fn create_consultation_category(
        &mut self,
        item: &ConsultationCategoryModel,
    ) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO consultation_categories (id, name, hours, is_custom) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(item.id)
        .bind(item.name.as_str())
        .bind(item.hours)
        .bind(item.is_custom)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
