/// Properties of a single column as reported by the engine. The engine reports them as one row of
/// flags per column of the result set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ColumnFlags {
    /// The column has been declared `NOT NULL`.
    pub not_null: bool,
    /// The column is part of the primary key of its table.
    pub primary_key: bool,
    /// Values of the column are generated by the engine on insert.
    pub auto_increment: bool,
}

impl ColumnFlags {
    /// `true` if the column may hold `NULL`. Expressions which are not backed by a table column
    /// count as nullable.
    pub fn could_be_nullable(&self) -> bool {
        !self.not_null
    }
}
