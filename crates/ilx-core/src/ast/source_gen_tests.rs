// Tests for source text generation

#[cfg(test)]
mod predicate_source_tests {
    use crate::ast::{SourceAst, ToSource};

    #[test]
    fn test_comparison_renders_infix() {
        let ast = SourceAst::method_call(
            SourceAst::local("amount"),
            ">",
            vec![SourceAst::Integer(100)],
        );
        assert_eq!(ast.to_source(), "amount > 100");
    }

    #[test]
    fn test_negation_and_logic() {
        let paid = SourceAst::method_call(SourceAst::local("order"), "paid?", vec![]);
        let ast = SourceAst::And {
            left: Box::new(SourceAst::method_call(paid, "!", vec![])),
            right: Box::new(SourceAst::InstanceVariableRead {
                name: "@open".to_string(),
            }),
        };
        assert_eq!(ast.to_source(), "!order.paid? && @open");
    }

    #[test]
    fn test_call_chain_with_arguments() {
        let ast = SourceAst::method_call(
            SourceAst::method_call(
                SourceAst::constant("OrderMailer"),
                "confirmation",
                vec![SourceAst::local("order")],
            ),
            "deliver_later",
            vec![],
        );
        assert_eq!(
            ast.to_source(),
            "OrderMailer.confirmation(order).deliver_later"
        );
    }

    #[test]
    fn test_index_and_hash() {
        let ast = SourceAst::method_call(
            SourceAst::local("params"),
            "[]",
            vec![SourceAst::sym("id")],
        );
        assert_eq!(ast.to_source(), "params[:id]");

        let hash = SourceAst::Hash {
            entries: vec![(SourceAst::sym("optional"), SourceAst::True)],
        };
        assert_eq!(hash.to_source(), "{optional: true}");
    }

    #[test]
    fn test_string_escaping() {
        let ast = SourceAst::str("say \"hi\"\n");
        assert_eq!(ast.to_source(), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn test_interpolation() {
        let ast = SourceAst::InterpolatedString {
            parts: vec![SourceAst::str("Hi "), SourceAst::local("name")],
        };
        assert_eq!(ast.to_source(), "\"Hi #{name}\"");
    }
}
