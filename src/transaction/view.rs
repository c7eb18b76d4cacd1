//! HTML for the new-transaction form and the transaction list shown on the dashboard.

use maud::{Markup, html};
use time::Date;

use crate::{
    category::Category,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency, submit_button,
    },
    transaction::core::{Frequency, Transaction},
};

/// The form for adding a transaction to the selected account, dated `today` by default.
pub fn new_transaction_form(categories: &[Category], today: Date) -> Markup {
    html! {
        form
            hx-post=(endpoints::TRANSACTIONS_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            div class="grid grid-cols-1 md:grid-cols-2 gap-4"
            {
                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    input
                        type="number"
                        name="amount"
                        id="amount"
                        step="0.01"
                        placeholder="-12.50"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);

                    p class="mt-1 text-xs text-gray-500 dark:text-gray-400"
                    {
                        "Use a negative amount for expenses."
                    }
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        type="date"
                        name="date"
                        id="date"
                        value=(today)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                    select name="category_id" id="category_id" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "Uncategorized" }

                        @for category in categories {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }

                div
                {
                    label for="frequency" class=(FORM_LABEL_STYLE) { "Repeats" }

                    select name="frequency" id="frequency" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for frequency in Frequency::ALL {
                            option
                                value=(frequency.as_str())
                                selected[frequency == Frequency::None]
                            {
                                (frequency.label())
                            }
                        }
                    }
                }
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    type="text"
                    name="description"
                    id="description"
                    placeholder="Weekly groceries"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (submit_button("Add Transaction"))
        }
    }
}

fn transaction_row(transaction: &Transaction, currency_symbol: &str) -> Markup {
    let delete_url = format_endpoint(endpoints::TRANSACTION, transaction.id);
    let amount_style = if transaction.amount < 0.0 {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class=(TABLE_CELL_STYLE) { (transaction.date) }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class=(TABLE_CELL_STYLE)
            {
                (transaction.category_name.as_deref().unwrap_or("Uncategorized"))
            }
            td class={ (TABLE_CELL_STYLE) " text-right " (amount_style) }
            {
                (format_currency(transaction.amount, currency_symbol))
            }
            td class=(TABLE_CELL_STYLE)
            {
                (transaction.frequency.label())

                @if let Some(next_due_date) = transaction.next_due_date {
                    span class="block text-xs text-gray-500 dark:text-gray-400"
                    {
                        "Next: " (next_due_date)
                    }
                }
            }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    hx-delete=(delete_url)
                    hx-confirm="Are you sure you want to delete this transaction?"
                    hx-target-error="#alert-container"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}

/// A table of `transactions` in the order given, with amounts in `currency_symbol`.
pub fn transactions_table(transactions: &[Transaction], currency_symbol: &str) -> Markup {
    html! {
        @if transactions.is_empty() {
            p class="text-gray-500 dark:text-gray-400" { "No transactions yet." }
        } @else {
            div class="relative overflow-x-auto shadow-md sm:rounded-lg"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Repeats" }
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            (transaction_row(transaction, currency_symbol))
                        }
                    }
                }
            }
        }
    }
}
