use crate::error::{MoveError, Result};
use crate::models::LiabilitySign;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

pub fn run(
    currency: Option<String>,
    liability_sign: Option<LiabilitySign>,
    data_dir: Option<String>,
) -> Result<()> {
    let mut settings = load_settings()?;
    let changed = currency.is_some() || liability_sign.is_some() || data_dir.is_some();

    if let Some(currency) = currency {
        settings.currency = currency.trim().to_uppercase();
    }
    if let Some(sign) = liability_sign {
        settings.liability_sign = sign;
    }
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir).to_string_lossy().to_string();
    }
    if changed {
        save_settings(&settings)?;
        println!("Saved {}", settings_path().display());
    }

    let json = serde_json::to_string_pretty(&settings)
        .map_err(|e| MoveError::Settings(e.to_string()))?;
    println!("# {}\n{json}", settings_path().display());
    Ok(())
}
