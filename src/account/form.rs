use maud::{Markup, html};

use crate::{
    account::core::{Account, AccountType, Currency},
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, submit_button},
};

/// The fields shared by the create and edit account forms.
///
/// Pass `account` to pre-fill the fields with its current values.
pub(super) fn account_form_fields(
    account: Option<&Account>,
    currencies: &[Currency],
    account_types: &[AccountType],
    submit_text: &str,
) -> Markup {
    let name = account.map(|account| account.name.as_str()).unwrap_or_default();
    let balance = account
        .map(|account| format!("{:.2}", account.balance))
        .unwrap_or_else(|| "0.00".to_owned());
    let currency_id = account.map(|account| account.currency.id);
    let account_type_id = account.map(|account| account.account_type.id);

    html! {
        div
        {
            label for="name" class=(FORM_LABEL_STYLE) { "Account Name" }

            input
                type="text"
                name="name"
                id="name"
                placeholder="Everyday"
                value=(name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="balance" class=(FORM_LABEL_STYLE) { "Balance" }

            input
                type="number"
                name="balance"
                id="balance"
                step="0.01"
                value=(balance)
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label for="currency_id" class=(FORM_LABEL_STYLE) { "Currency" }

            select name="currency_id" id="currency_id" required class=(FORM_TEXT_INPUT_STYLE)
            {
                @for currency in currencies {
                    option
                        value=(currency.id)
                        selected[currency_id == Some(currency.id)]
                    {
                        (currency.code) " - " (currency.name)
                    }
                }
            }
        }

        div
        {
            label for="account_type_id" class=(FORM_LABEL_STYLE) { "Account Type" }

            select
                name="account_type_id"
                id="account_type_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                @for account_type in account_types {
                    option
                        value=(account_type.id)
                        selected[account_type_id == Some(account_type.id)]
                    {
                        (account_type.name)
                    }
                }
            }
        }

        (submit_button(submit_text))
    }
}
