//! Typed record for the VAT declaration form 01/GTGT.
//!
//! A declaration arrives as an untyped JSON payload. [`Declaration::from_value`] is the single
//! validation pass: it deserializes the payload into the structs below (filling every missing
//! amount with `0`) and then checks the few structural rules the context engine relies on, most
//! importantly that the tax period carries the month or quarter its type announces.
//!
//! The bracketed numbers in the field docs are the indicator codes printed on the paper form.
//!
//! Every struct is exposed to the context engine through the named-field accessor, so mapping
//! paths such as `tax_calc.output_sales.vat_10.vat` traverse the typed record directly.

use crate::model::record::{AsNode, Node};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Reasons a payload is rejected before it reaches the context engine.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("declaration payload does not match the schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("tax period of type '{period_type}' requires a {field}")]
    MissingPeriodPart {
        period_type: PeriodType,
        field: &'static str,
    },

    #[error("tax period {field} {value} is out of range {min}..={max}")]
    PeriodOutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} must not be blank")]
    Blank { field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Month,
    Quarter,
}

impl PeriodType {
    pub fn code(self) -> &'static str {
        match self {
            PeriodType::Month => "month",
            PeriodType::Quarter => "quarter",
        }
    }
}

impl fmt::Display for PeriodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl AsNode for PeriodType {
    fn as_node(&self) -> Node<'_> {
        Node::Text(self.code())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meta {
    pub first_time: Option<String>,
    pub revision_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxPeriod {
    #[serde(rename = "type")]
    pub period_type: PeriodType,
    pub month: Option<u8>,
    pub quarter: Option<u8>,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxpayer {
    pub name: String,
    pub tax_code: String,
    pub address: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Agency {
    pub name: Option<String>,
    pub tax_code: Option<String>,
    pub contract_number: Option<String>,
    pub contract_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddressDetail {
    pub ward: Option<String>,
    pub district: Option<String>,
    pub province: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Branch {
    pub name: Option<String>,
    pub tax_code: Option<String>,
    pub address: Option<AddressDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Business {
    pub activity_name: String,
    pub scale: String,
    pub method: String,
}

/// Goods value and VAT amount for one tax rate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VatRateDetail {
    pub value: i64,
    pub vat: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputPurchases {
    /// [23]
    pub value: i64,
    /// [24]
    pub vat: i64,
    /// [23a], [24a]
    pub imports: Option<VatRateDetail>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSales {
    /// [26]
    pub non_vat: i64,
    /// [29]
    pub vat_0: i64,
    /// [30], [31]
    pub vat_5: VatRateDetail,
    /// [32], [33]
    pub vat_10: VatRateDetail,
    /// [32a]
    pub not_taxed: i64,
}

/// [27], [28], [34], [35]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputTotal {
    pub value: i64,
    pub vat: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCalc {
    /// [21], `"X"` when the business had no activity in the period.
    #[serde(default)]
    pub no_activity: Option<String>,
    /// [22]
    #[serde(default)]
    pub deductible_previous: i64,
    pub input_purchases: InputPurchases,
    /// [25]
    #[serde(default)]
    pub deductible_period: i64,
    pub output_sales: OutputSales,
    pub output_total: OutputTotal,
    /// [36]
    #[serde(default)]
    pub vat_period: i64,
    /// [37]
    #[serde(default)]
    pub adjustment_decrease: i64,
    /// [38]
    #[serde(default)]
    pub adjustment_increase: i64,
    /// [39a]
    #[serde(default)]
    pub vat_received_deduction: i64,
    /// [40a]
    #[serde(default)]
    pub vat_payable_period: i64,
    /// [40b]
    #[serde(default)]
    pub vat_investment_offset: i64,
    /// [40]
    #[serde(default)]
    pub vat_payable_final: i64,
    /// [41]
    #[serde(default)]
    pub vat_remaining_unpaid: i64,
    /// [42]
    #[serde(default)]
    pub vat_refund_claim: i64,
    /// [43]
    #[serde(default)]
    pub vat_transfer_next: i64,
}

/// Root of a 01/GTGT declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    /// Form code, e.g. `01_GTGT_2021`.
    pub declaration_type: String,
    #[serde(default)]
    pub meta: Option<Meta>,
    pub tax_period: TaxPeriod,
    pub taxpayer: Taxpayer,
    #[serde(default)]
    pub agency: Option<Agency>,
    #[serde(default)]
    pub branch: Option<Branch>,
    pub business: Business,
    /// Additional revenue data kept as free-form JSON.
    #[serde(default, deserialize_with = "null_as_empty_map")]
    pub revenue: Map<String, Value>,
    pub tax_calc: TaxCalc,
}

fn null_as_empty_map<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Declaration {
    /// Deserializes and validates a declaration payload.
    pub fn from_value(payload: Value) -> Result<Self, ValidationError> {
        let declaration: Declaration = serde_json::from_value(payload)?;
        declaration.validate()?;
        Ok(declaration)
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.taxpayer.name.trim().is_empty() {
            return Err(ValidationError::Blank {
                field: "taxpayer.name",
            });
        }
        if self.taxpayer.tax_code.trim().is_empty() {
            return Err(ValidationError::Blank {
                field: "taxpayer.tax_code",
            });
        }
        self.tax_period.validate()
    }
}

impl TaxPeriod {
    fn validate(&self) -> Result<(), ValidationError> {
        check_range("year", i64::from(self.year), 1900, 9999)?;

        let (field, part, max) = match self.period_type {
            PeriodType::Month => ("month", self.month, 12),
            PeriodType::Quarter => ("quarter", self.quarter, 4),
        };
        let part = part.ok_or(ValidationError::MissingPeriodPart {
            period_type: self.period_type,
            field,
        })?;
        check_range(field, i64::from(part), 1, max)
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::PeriodOutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

crate::named_fields!(Meta {
    first_time,
    revision_number
});
crate::named_fields!(TaxPeriod {
    period_type as "type",
    month,
    quarter,
    year
});
crate::named_fields!(Taxpayer {
    name,
    tax_code,
    address,
    phone
});
crate::named_fields!(Agency {
    name,
    tax_code,
    contract_number,
    contract_date
});
crate::named_fields!(AddressDetail {
    ward,
    district,
    province
});
crate::named_fields!(Branch {
    name,
    tax_code,
    address
});
crate::named_fields!(Business {
    activity_name,
    scale,
    method
});
crate::named_fields!(VatRateDetail { value, vat });
crate::named_fields!(InputPurchases {
    value,
    vat,
    imports
});
crate::named_fields!(OutputSales {
    non_vat,
    vat_0,
    vat_5,
    vat_10,
    not_taxed
});
crate::named_fields!(OutputTotal { value, vat });
crate::named_fields!(TaxCalc {
    no_activity,
    deductible_previous,
    input_purchases,
    deductible_period,
    output_sales,
    output_total,
    vat_period,
    adjustment_decrease,
    adjustment_increase,
    vat_received_deduction,
    vat_payable_period,
    vat_investment_offset,
    vat_payable_final,
    vat_remaining_unpaid,
    vat_refund_claim,
    vat_transfer_next,
});
crate::named_fields!(Declaration {
    declaration_type,
    meta,
    tax_period,
    taxpayer,
    agency,
    branch,
    business,
    revenue,
    tax_calc,
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::NamedFields;
    use serde_json::json;

    fn payload() -> Value {
        json!({
            "declaration_type": "01_GTGT_2021",
            "tax_period": { "type": "month", "month": 3, "year": 2025 },
            "taxpayer": { "name": "ACME", "tax_code": "0101234567", "address": "Hà Nội" },
            "business": { "activity_name": "Thương mại", "scale": "small", "method": "deduction" },
            "tax_calc": {
                "input_purchases": { "value": 1000000, "vat": 100000 },
                "output_sales": { "vat_10": { "value": 5000000, "vat": 500000 } },
                "output_total": { "value": 5000000, "vat": 500000 }
            }
        })
    }

    #[test]
    fn missing_amounts_default_to_zero() {
        let declaration = Declaration::from_value(payload()).unwrap();
        assert_eq!(declaration.tax_calc.vat_period, 0);
        assert_eq!(declaration.tax_calc.output_sales.vat_5.vat, 0);
        assert_eq!(declaration.tax_calc.output_sales.vat_10.vat, 500000);
        assert!(declaration.revenue.is_empty());
    }

    #[test]
    fn null_revenue_is_accepted() {
        let mut raw = payload();
        raw["revenue"] = Value::Null;
        assert!(Declaration::from_value(raw).unwrap().revenue.is_empty());
    }

    #[test]
    fn month_period_requires_month() {
        let mut raw = payload();
        raw["tax_period"] = json!({ "type": "month", "quarter": 1, "year": 2025 });
        let err = Declaration::from_value(raw).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MissingPeriodPart { field: "month", .. }
        ));
    }

    #[test]
    fn quarter_out_of_range_is_rejected() {
        let mut raw = payload();
        raw["tax_period"] = json!({ "type": "quarter", "quarter": 5, "year": 2025 });
        let err = Declaration::from_value(raw).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::PeriodOutOfRange { field: "quarter", value: 5, .. }
        ));
    }

    #[test]
    fn unknown_period_type_is_a_schema_error() {
        let mut raw = payload();
        raw["tax_period"]["type"] = json!("week");
        assert!(matches!(
            Declaration::from_value(raw),
            Err(ValidationError::Schema(_))
        ));
    }

    #[test]
    fn blank_tax_code_is_rejected() {
        let mut raw = payload();
        raw["taxpayer"]["tax_code"] = json!("  ");
        assert!(matches!(
            Declaration::from_value(raw),
            Err(ValidationError::Blank { field: "taxpayer.tax_code" })
        ));
    }

    #[test]
    fn period_type_is_exposed_under_its_wire_name() {
        let declaration = Declaration::from_value(payload()).unwrap();
        let period = declaration.tax_period.field("type");
        assert_eq!(period.and_then(Node::as_str), Some("month"));
        assert!(declaration.tax_period.field("period_type").is_none());
    }
}
