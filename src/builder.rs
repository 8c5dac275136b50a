use crate::config::{BridgeConfig, FUNCALL_SYMBOL};
use crate::cons::{build_list, quote_with, QUOTE_SYMBOL};
use crate::value::Value;

/// Composes the expressions sent over a channel. Pure: nothing here talks
/// to the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionBuilder {
    quote_symbol: String,
    funcall_symbol: String,
}

impl Default for ExpressionBuilder {
    fn default() -> Self {
        Self {
            quote_symbol: QUOTE_SYMBOL.to_string(),
            funcall_symbol: FUNCALL_SYMBOL.to_string(),
        }
    }
}

impl ExpressionBuilder {
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            quote_symbol: config.quote_symbol.clone(),
            funcall_symbol: config.funcall_symbol.clone(),
        }
    }

    pub fn quote(&self, value: Value) -> Value {
        quote_with(&self.quote_symbol, value)
    }

    pub fn list<I>(&self, values: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        build_list(values)
    }

    /// `(FUNCALL function 'arg...)`: `function` is left unquoted.
    pub fn funcall<I>(&self, function: Value, args: I) -> Value
    where
        I: IntoIterator<Item = Value>,
    {
        let head = [Value::symbol(self.funcall_symbol.as_str()), function];
        let quoted = args.into_iter().map(|arg| self.quote(arg));
        build_list(head.into_iter().chain(quoted))
    }
}
