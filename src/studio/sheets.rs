//! Sheet tabs: ordering, activation, and copy naming.

use regex::Regex;
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use utoipa::ToSchema;

use super::StudioError;

#[derive(ToSchema, Clone, Debug, Serialize, Deserialize)]
pub struct Sheet {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// Ordered tab strip. Exactly one sheet is active and the strip never goes
/// empty.
#[derive(Clone, Debug, Serialize)]
#[serde(transparent)]
pub struct Sheets(Vec<Sheet>);

impl Default for Sheets {
    fn default() -> Self {
        Self(vec![Sheet {
            id: new_sheet_id(),
            name: "Sheet 1".to_string(),
            active: true,
        }])
    }
}

fn new_sheet_id() -> String {
    format!("sheet-{}", Ulid::new().to_string().to_lowercase())
}

impl Sheets {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Sheet> {
        self.0.iter().find(|sheet| sheet.id == id)
    }

    /// Append a new inactive sheet named after the current count.
    pub fn add(&mut self) -> Sheet {
        let sheet = Sheet {
            id: new_sheet_id(),
            name: format!("Sheet {}", self.0.len() + 1),
            active: false,
        };
        self.0.push(sheet.clone());
        sheet
    }

    /// Copy a sheet under a parenthetical suffix derived from the number of
    /// existing copies.
    pub fn duplicate(&mut self, id: &str) -> Result<Sheet, StudioError> {
        let source = self.get(id).ok_or(StudioError::UnknownSheet)?;
        let sheet = Sheet {
            id: new_sheet_id(),
            name: self.copy_name(&source.name),
            active: false,
        };
        self.0.push(sheet.clone());
        Ok(sheet)
    }

    fn copy_name(&self, name: &str) -> String {
        let base = Regex::new(r"\s\(\d+\)$")
            .map_or_else(|_| name.to_string(), |re| re.replace(name, "").into_owned());
        let prefix = format!("{base} (");
        let copies = self
            .0
            .iter()
            .filter(|sheet| sheet.name.starts_with(&prefix))
            .count();
        format!("{base} ({})", copies + 2)
    }

    /// Rename a sheet; empty names are refused.
    pub fn rename(&mut self, id: &str, name: &str) -> Result<(), StudioError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StudioError::EmptyName);
        }
        let sheet = self
            .0
            .iter_mut()
            .find(|sheet| sheet.id == id)
            .ok_or(StudioError::UnknownSheet)?;
        sheet.name = trimmed.to_string();
        Ok(())
    }

    /// Make one sheet active and every other inactive.
    pub fn activate(&mut self, id: &str) -> Result<(), StudioError> {
        if self.get(id).is_none() {
            return Err(StudioError::UnknownSheet);
        }
        for sheet in &mut self.0 {
            sheet.active = sheet.id == id;
        }
        Ok(())
    }

    /// Remove a sheet; refuses to empty the strip, and hands the active flag
    /// to the first remaining sheet when the active one goes away.
    pub fn remove(&mut self, id: &str) -> Result<(), StudioError> {
        if self.0.len() <= 1 {
            return Err(StudioError::LastSheet);
        }
        let index = self
            .0
            .iter()
            .position(|sheet| sheet.id == id)
            .ok_or(StudioError::UnknownSheet)?;
        let removed = self.0.remove(index);
        if removed.active {
            if let Some(first) = self.0.first_mut() {
                first.active = true;
            }
        }
        Ok(())
    }
}
