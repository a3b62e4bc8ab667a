//! Public contact form

use anyhow::{Context, Result};

use folio_core::mutation::submit_lead;
use folio_core::views::{service_inquiry_message, visible_services};
use folio_core::{ContactForm, Folio};

use crate::output::Output;

pub async fn send(
    app: &Folio,
    name: String,
    email: String,
    message: Option<String>,
    service: Option<String>,
    output: &Output,
) -> Result<()> {
    let message = match (message, service) {
        (Some(message), _) => message,
        (None, Some(title)) => {
            let snapshot = super::ready(app).await?;
            let service = visible_services(&snapshot)
                .into_iter()
                .find(|s| s.title.eq_ignore_ascii_case(&title))
                .with_context(|| format!("No service named '{}'", title))?;
            service_inquiry_message(service)
        }
        (None, None) => String::new(),
    };

    let form = ContactForm::new(name, email, message);
    let id = submit_lead(app.store.as_ref(), &form, app.config.request_timeout()).await?;

    if output.is_quiet() {
        println!("{}", id);
    }
    output.success("Message sent. Thanks for reaching out!");
    Ok(())
}
