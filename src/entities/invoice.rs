use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice raised against a confirmed sales order. `invoice_number` is
/// unique; `payment_status` is derived from the applied payments and never
/// set directly by callers.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub invoice_number: String,
    pub invoice_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub total_amount: Decimal,
    pub tax_amount: Decimal,
    pub payment_status: PaymentStatus,
    #[sea_orm(nullable)]
    pub notes: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Derived payment state of an invoice. Moves Pending → Partial → Paid as
/// cumulative payments grow and never regresses. Overdue is declared for
/// completeness but is driven externally (due-date sweeps are not part of
/// this core).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

impl PaymentStatus {
    /// Derives the payment status from cumulative payments against the
    /// invoice total.
    pub fn from_amounts(total_paid: Decimal, total_amount: Decimal) -> Self {
        if total_paid >= total_amount {
            PaymentStatus::Paid
        } else if total_paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sales_order::Entity",
        from = "Column::OrderId",
        to = "super::sales_order::Column::Id"
    )]
    Order,
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
}

impl Related<super::sales_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_derivation_thresholds() {
        assert_eq!(
            PaymentStatus::from_amounts(dec!(0), dec!(100)),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::from_amounts(dec!(40), dec!(100)),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::from_amounts(dec!(100), dec!(100)),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn derivation_is_monotonic_in_total_paid() {
        let total = dec!(100);
        let mut last_rank = 0;
        for paid in [dec!(0), dec!(1), dec!(40), dec!(99.99), dec!(100)] {
            let rank = match PaymentStatus::from_amounts(paid, total) {
                PaymentStatus::Pending => 0,
                PaymentStatus::Partial => 1,
                PaymentStatus::Paid => 2,
                PaymentStatus::Overdue => unreachable!("never derived"),
            };
            assert!(rank >= last_rank);
            last_rank = rank;
        }
    }
}
