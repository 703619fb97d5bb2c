//! Builders for engine and store tests.

use chrono::Utc;
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    AuditRequestModel, AuditRequestStatus, AuditServiceType, CompanyModel,
    ConsultationCategoryModel, ConsultationRequestModel, ConsultationStatus, DocumentRequestModel,
    DocumentRequestStatus, PartnerModel,
};

pub fn create_test_partner(commission_rate: Decimal, hours_balance: Decimal) -> PartnerModel {
    PartnerModel {
        id: Uuid::new_v4(),
        name: HeaplessString::try_from("Test Partner").unwrap(),
        commission_rate,
        total_commissions: Decimal::ZERO,
        pending_commissions: Decimal::ZERO,
        hours_balance,
        created_at: Utc::now(),
    }
}

pub fn create_test_company(referring_partner_id: Option<Uuid>) -> CompanyModel {
    CompanyModel {
        id: Uuid::new_v4(),
        name: HeaplessString::try_from("Test Company SA").unwrap(),
        tax_id: None,
        referring_partner_id,
    }
}

pub fn create_test_audit_request(
    company_id: Uuid,
    referring_partner_id: Option<Uuid>,
    status: AuditRequestStatus,
) -> AuditRequestModel {
    AuditRequestModel {
        id: Uuid::new_v4(),
        company_id,
        referring_partner_id,
        service_type: AuditServiceType::FinancialAudit,
        fiscal_year: 2024,
        urgent: false,
        status,
        quoted_amount: None,
        quote_notes: None,
        quote_valid_until: None,
        requested_at: Utc::now(),
        quoted_at: None,
        decided_at: None,
        started_at: None,
        finished_at: None,
    }
}

pub fn create_test_consultation(partner_id: Uuid, urgent: bool) -> ConsultationRequestModel {
    ConsultationRequestModel {
        id: Uuid::new_v4(),
        partner_id,
        title: "Transfer pricing question".into(),
        description: None,
        urgent,
        status: ConsultationStatus::Pending,
        category_id: None,
        assigned_hours: None,
        requested_at: Utc::now(),
        quoted_at: None,
        accepted_at: None,
        started_at: None,
        finished_at: None,
    }
}

pub fn create_test_category(hours: Decimal, is_custom: bool) -> ConsultationCategoryModel {
    ConsultationCategoryModel {
        id: Uuid::new_v4(),
        name: HeaplessString::try_from(if is_custom { "Custom" } else { "Standard review" })
            .unwrap(),
        hours,
        is_custom,
    }
}

pub fn create_test_document_request(
    audit_request_id: Uuid,
    status: DocumentRequestStatus,
) -> DocumentRequestModel {
    DocumentRequestModel {
        id: Uuid::new_v4(),
        audit_request_id,
        title: "Trial balance".into(),
        status,
        requested_at: Utc::now(),
    }
}
