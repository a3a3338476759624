use std::fmt::{self, Display, Formatter};

use tabled::{builder::Builder, settings::Style as TableStyle};

use super::painter::Painter;

/// Rounded text table used by the fan views.
#[derive(Debug)]
pub(crate) struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// One row per record; every row has as many cells as the header.
    pub(crate) fn columns<const N: usize>(
        header: [&str; N],
        rows: impl IntoIterator<Item = [String; N]>,
    ) -> Self {
        Self {
            header: header.iter().map(|name| (*name).to_string()).collect(),
            rows: rows.into_iter().map(Vec::from).collect(),
        }
    }

    /// `field | value` pairs with labelled field names.
    pub(crate) fn fields<'a>(
        painter: &Painter,
        fields: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Self {
        Self::columns(
            ["field", "value"],
            fields
                .into_iter()
                .map(|(name, value)| [painter.label(name), value]),
        )
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(&self.header);
        for row in &self.rows {
            builder.push_record(row);
        }
        let mut table = builder.build();
        table.with(TableStyle::rounded());
        write!(f, "{table}")
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    #[test]
    fn field_table_lists_fan_readings() {
        let painter = Painter::new(false);

        let table = Table::fields(
            &painter,
            [("speed", "2".to_string()), ("light", "50%".to_string())],
        );

        assert_snapshot!(table.to_string(), @r"
        ╭───────┬───────╮
        │ field │ value │
        ├───────┼───────┤
        │ speed │ 2     │
        │ light │ 50%   │
        ╰───────┴───────╯
        ");
    }

    #[test]
    fn column_table_without_rows_keeps_the_header() {
        let table = Table::columns(["address", "rssi"], Vec::<[String; 2]>::new());

        let rendered = table.to_string();

        assert!(rendered.contains("│ address │ rssi │"));
    }
}
