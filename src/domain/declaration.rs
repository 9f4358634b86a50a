use crate::domain::{SignatureImage, SignerRole};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Width of the printed declaration number
pub const NUMBER_WIDTH: usize = 8;

/// Number the sequence continues from when no declaration exists yet
pub const FIRST_NUMBER_BASE: u64 = 21525;

/// Issuing city printed on generated declarations
pub const DEFAULT_CITY: &str = "CAMPINAS";

const MONTHS: [&str; 12] = [
    "JANEIRO", "FEVEREIRO", "MARÇO", "ABRIL", "MAIO", "JUNHO", "JULHO", "AGOSTO", "SETEMBRO",
    "OUTUBRO", "NOVEMBRO", "DEZEMBRO",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub description: String,
    pub model: String,
    pub serial_number: String,
    pub unit_value: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SenderData {
    pub name: String,
    pub cpf: String,
    pub address: String,
    pub number: String,
    pub bairro: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub company_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarrierData {
    pub driver_name: String,
    pub rg: String,
    pub collection_date: String,
    pub company_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipientData {
    pub name: String,
    pub address: String,
    pub city_state: String,
    pub zip_code: String,
    pub cnpj: String,
    pub ie: String,
}

/// Shipment declaration, the record signatures are attached to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    pub id: String,
    pub number: String,
    pub date: String,
    pub city: String,
    #[serde(default)]
    pub recipient: RecipientData,
    #[serde(default)]
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub sender: SenderData,
    #[serde(default)]
    pub carrier: CarrierData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_sender: Option<SignatureImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_carrier: Option<SignatureImage>,
}

impl Declaration {
    pub fn new(
        number: u64,
        city: &str,
        recipient: RecipientData,
        equipment: Vec<Equipment>,
        sender: SenderData,
        carrier: CarrierData,
    ) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let date = Self::format_date(chrono::Local::now().date_naive());

        Self {
            id,
            number: Self::format_number(number),
            date,
            city: city.to_uppercase(),
            recipient,
            equipment,
            sender,
            carrier,
            signature_sender: None,
            signature_carrier: None,
        }
    }

    pub fn format_number(number: u64) -> String {
        format!("{:0width$}", number, width = NUMBER_WIDTH)
    }

    /// Long Brazilian form, uppercased: `19 DE OUTUBRO DE 2026`
    pub fn format_date(date: NaiveDate) -> String {
        format!(
            "{:02} DE {} DE {}",
            date.day(),
            MONTHS[date.month0() as usize],
            date.year()
        )
    }

    /// Numeric value of `number`, if it parses
    pub fn parsed_number(&self) -> Option<u64> {
        self.number.trim().parse().ok()
    }

    pub fn signature(&self, role: SignerRole) -> Option<&SignatureImage> {
        match role {
            SignerRole::Sender => self.signature_sender.as_ref(),
            SignerRole::Carrier => self.signature_carrier.as_ref(),
        }
    }

    /// Replace one role's signature, leaving the other untouched
    pub fn set_signature(&mut self, role: SignerRole, image: Option<SignatureImage>) {
        match role {
            SignerRole::Sender => self.signature_sender = image,
            SignerRole::Carrier => self.signature_carrier = image,
        }
    }

    pub fn is_signed_by(&self, role: SignerRole) -> bool {
        self.signature(role).is_some()
    }

    pub fn is_fully_signed(&self) -> bool {
        SignerRole::ALL.iter().all(|role| self.is_signed_by(*role))
    }

    pub fn total_value(&self) -> f64 {
        self.equipment.iter().map(|e| e.unit_value).sum()
    }
}
