//! Markup shared by the report pages and the dashboard.

use maud::{Markup, html};

use crate::{
    category::CategoryKind,
    html::{
        CARD_STYLE, CATEGORY_BADGE_STYLE, EXPENSE_TEXT_STYLE, INCOME_TEXT_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency, format_percentage,
    },
    report::aggregation::{CategoryTotal, PeriodSummary},
};

/// Three cards with the income, expenses and balance of a period.
pub(crate) fn summary_cards_view(summary: &PeriodSummary) -> Markup {
    let balance_style = if summary.balance.is_sign_negative() {
        EXPENSE_TEXT_STYLE
    } else {
        INCOME_TEXT_STYLE
    };

    let card = |id: &str, label: &str, amount: String, style: &str| {
        html! {
            div id=(id) class=(CARD_STYLE)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
                p class={"text-2xl font-bold " (style)} { (amount) }
            }
        }
    };

    html! {
        section class="grid grid-cols-1 sm:grid-cols-3 gap-4 w-full"
        {
            (card("total-income", "Income", format_currency(summary.income), INCOME_TEXT_STYLE))
            (card("total-expenses", "Expenses", format_currency(summary.expense), EXPENSE_TEXT_STYLE))
            (card("balance", "Balance", format_currency(summary.balance), balance_style))
        }
    }
}

/// A table of category totals with a bar showing each category's share.
pub(crate) fn breakdown_table_view(
    id: &str,
    kind: CategoryKind,
    breakdown: &[CategoryTotal],
) -> Markup {
    let (heading, bar_colour) = match kind {
        CategoryKind::Income => ("Income by Category", "bg-green-500"),
        CategoryKind::Expense => ("Expenses by Category", "bg-red-500"),
    };

    html! {
        section id=(id) class="w-full space-y-2"
        {
            h2 class="text-lg font-semibold" { (heading) }

            @if breakdown.is_empty() {
                p class="text-gray-500 dark:text-gray-400" { "Nothing recorded for this period." }
            } @else {
                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Total" }
                                th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Count" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Share" }
                            }
                        }

                        tbody
                        {
                            @for row in breakdown {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        span class=(CATEGORY_BADGE_STYLE) { (row.category.title_with_icon()) }
                                    }
                                    td class={(TABLE_CELL_STYLE) " text-right font-mono"} { (format_currency(row.total)) }
                                    td class={(TABLE_CELL_STYLE) " text-right"} { (row.count) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        div class="flex items-center gap-2"
                                        {
                                            div class="w-24 h-2 rounded bg-gray-200 dark:bg-gray-700"
                                            {
                                                div
                                                    class={"h-2 rounded " (bar_colour)}
                                                    style=(format!("width: {}%", row.percentage.round_dp(1)))
                                                {}
                                            }
                                            span { (format_percentage(row.percentage)) }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use scraper::{Html, Selector};

    use crate::{
        category::{Category, CategoryKind, CategoryTitle},
        html::format_currency,
        report::aggregation::{CategoryTotal, PeriodSummary},
    };

    use super::{breakdown_table_view, summary_cards_view};

    #[test]
    fn summary_cards_show_each_total() {
        let markup = summary_cards_view(&PeriodSummary {
            income: Decimal::from(1000),
            expense: Decimal::from(200),
            balance: Decimal::from(800),
        });

        let html = Html::parse_fragment(&markup.into_string());
        for (id, want) in [
            ("#total-income", format_currency(Decimal::from(1000))),
            ("#total-expenses", format_currency(Decimal::from(200))),
            ("#balance", format_currency(Decimal::from(800))),
        ] {
            let text = html
                .select(&Selector::parse(id).unwrap())
                .next()
                .unwrap_or_else(|| panic!("{id} missing"))
                .text()
                .collect::<String>();
            assert!(text.contains(&want), "{id}: want {want}, got {text}");
        }
    }

    #[test]
    fn breakdown_rows_show_percentage() {
        let breakdown = vec![CategoryTotal {
            category: Category {
                id: 1,
                title: CategoryTitle::new_unchecked("Rent"),
                icon: "🏠".to_owned(),
                kind: CategoryKind::Expense,
            },
            total: Decimal::from(300),
            count: 2,
            percentage: Decimal::ONE_HUNDRED,
        }];

        let markup = breakdown_table_view("expense-breakdown", CategoryKind::Expense, &breakdown);

        let html = Html::parse_fragment(&markup.into_string());
        let cells = html
            .select(&Selector::parse("tbody td").unwrap())
            .map(|cell| cell.text().collect::<String>().trim().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(cells[0], "🏠 Rent");
        assert_eq!(cells[2], "2");
        assert_eq!(cells[3], "100.0%");
    }

    #[test]
    fn empty_breakdown_shows_placeholder() {
        let markup = breakdown_table_view("income-breakdown", CategoryKind::Income, &[]);

        assert!(markup.into_string().contains("Nothing recorded for this period."));
    }
}
