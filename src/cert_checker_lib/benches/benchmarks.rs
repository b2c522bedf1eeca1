//! Microbenchmarks for the `cert_checker`.
//!
//! The benchmarks run on synthetic projects, so that no external inputs are needed:
//!
//! - record layout computation during normalization,
//! - the padding analysis on deeply nested records,
//! - the individual checkers.
//!
//! # Running the Benchmarks
//!
//! ```
//! $ cargo bench --bench "benchmarks" -- --save-baseline master
//! ```
//!
//! After making a change, compare against the saved baseline with
//!
//! ```
//! $ cargo bench --bench "benchmarks" -- --baseline master
//! ```

use std::time;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

use cert_checker_lib::analysis::padding::PaddingAnalysis;
use cert_checker_lib::intermediate_representation::*;
use cert_checker_lib::pipeline::AnalysisResults;
use cert_checker_lib::utils;

mod inputs {
    //! Generators for the synthetic benchmark projects.

    use super::*;

    /// Number of records in the record chain.
    pub const NUM_RECORDS: usize = 40;
    /// Number of branches in the function explored by the EXP51 check.
    pub const NUM_BRANCHES: usize = 8;

    fn builtin(builtin: BuiltinType) -> Type {
        Type::Builtin(builtin)
    }

    fn field(name: &str, ty: Type) -> Field {
        Field {
            name: Some(name.to_string()),
            ty,
            bit_width: None,
            access: AccessSpecifier::Public,
            is_static: false,
            no_unique_address: false,
        }
    }

    fn record(name: String, bases: Vec<BaseSpecifier>, fields: Vec<Field>) -> Record {
        Record {
            name,
            kind: RecordKind::Struct,
            definition: Some(RecordDefinition {
                bases,
                fields,
                has_virtual_functions: false,
                max_field_alignment: None,
                layout: None,
            }),
        }
    }

    fn term<T>(id: String, term: T) -> Term<T> {
        Term {
            tid: Tid::new(&id).with_address(format!("bench.cpp:{id}")),
            term,
        }
    }

    /// A chain of records, each containing the previous one as a member, an array of it and a bitfield.
    pub fn records() -> Vec<Record> {
        let mut records = vec![record(
            "R0".to_string(),
            Vec::new(),
            vec![
                field("c", builtin(BuiltinType::Char)),
                field("i", builtin(BuiltinType::Int)),
            ],
        )];
        for index in 1..NUM_RECORDS {
            let previous = Type::Record(format!("R{}", index - 1));
            let mut bitfield = field("flags", builtin(BuiltinType::Int));
            bitfield.bit_width = Some(3);
            records.push(record(
                format!("R{index}"),
                vec![BaseSpecifier {
                    record: format!("R{}", index - 1),
                    access: AccessSpecifier::Public,
                    is_virtual: false,
                }],
                vec![
                    field("c", builtin(BuiltinType::Char)),
                    field("inner", previous.clone()),
                    field(
                        "elements",
                        Type::Array {
                            element: Box::new(previous),
                            count: 2,
                        },
                    ),
                    bitfield,
                ],
            ));
        }
        records
    }

    fn memcmp_of(record_name: &str, id: String) -> Term<Stmt> {
        let ty = Type::Record(record_name.to_string());
        let operand = |name: &str| Expression::ImplicitCast {
            ty: Type::Pointer(Box::new(Type::Void)),
            arg: Box::new(Expression::AddressOf(Box::new(Expression::Var(Variable {
                name: name.to_string(),
                ty: ty.clone(),
            })))),
        };
        term(
            id,
            Stmt::Expr(Expression::Call {
                target: "memcmp".to_string(),
                args: vec![operand("a"), operand("b"), Expression::SizeOf(ty.clone())],
                ty: builtin(BuiltinType::Int),
            }),
        )
    }

    /// A function comparing each record of the record chain,
    /// followed by a sequence of branches with an array allocation and deletion on each path.
    pub fn program() -> Term<Program> {
        let stmts = (0..NUM_RECORDS)
            .rev()
            .map(|index| memcmp_of(&format!("R{index}"), format!("memcmp_{index}")))
            .collect();
        let base_ptr = Variable {
            name: "b".to_string(),
            ty: Type::Pointer(Box::new(Type::Record("R0".to_string()))),
        };
        let mut blocks = vec![term(
            "entry".to_string(),
            Blk {
                stmts,
                jmps: vec![term("entry_jmp".to_string(), Jmp::Branch(Tid::new("branch_0")))],
            },
        )];
        for index in 0..NUM_BRANCHES {
            let next = Tid::new(format!("branch_{}", index + 1));
            let allocation = term(
                format!("new_{index}"),
                Stmt::Assign {
                    var: base_ptr.clone(),
                    value: Expression::ImplicitCast {
                        ty: base_ptr.ty.clone(),
                        arg: Box::new(Expression::New {
                            ty: Type::Record("R1".to_string()),
                            array_size: Some(Box::new(Expression::IntLiteral(4))),
                        }),
                    },
                },
            );
            blocks.push(term(
                format!("branch_{index}"),
                Blk {
                    stmts: Vec::new(),
                    jmps: vec![
                        term(
                            format!("cond_{index}"),
                            Jmp::CBranch {
                                target: Tid::new(format!("allocate_{index}")),
                                condition: Expression::Var(Variable {
                                    name: "flag".to_string(),
                                    ty: builtin(BuiltinType::Bool),
                                }),
                            },
                        ),
                        term(format!("skip_{index}"), Jmp::Branch(next.clone())),
                    ],
                },
            ));
            blocks.push(term(
                format!("allocate_{index}"),
                Blk {
                    stmts: vec![allocation],
                    jmps: vec![term(format!("join_{index}"), Jmp::Branch(next))],
                },
            ));
        }
        blocks.push(term(
            format!("branch_{NUM_BRANCHES}"),
            Blk {
                stmts: vec![term(
                    "delete".to_string(),
                    Stmt::Delete {
                        argument: Expression::Var(base_ptr),
                        array_form: true,
                    },
                )],
                jmps: vec![term("return".to_string(), Jmp::Return(None))],
            },
        ));
        term(
            "program".to_string(),
            Program {
                subs: vec![term(
                    "main".to_string(),
                    Sub {
                        name: "main".to_string(),
                        params: Vec::new(),
                        blocks,
                    },
                )],
            },
        )
    }

    /// The project before normalization, i.e. without record layouts.
    pub fn unnormalized_project() -> Project {
        Project {
            program: program(),
            records: records()
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
            typedefs: Default::default(),
            datatype_properties: DatatypeProperties::default(),
        }
    }

    pub fn project() -> Project {
        let mut project = unnormalized_project();
        let _ = project.normalize();
        project
    }

    pub fn get_config() -> serde_json::Value {
        utils::get_default_config().expect("the bundled configuration is valid")
    }
}

mod normalization {
    use super::*;

    pub fn bench_normalize(c: &mut Criterion) {
        c.bench_function("normalize_record_chain", |b| {
            b.iter_batched(
                inputs::unnormalized_project,
                |mut project| black_box(project.normalize()),
                BatchSize::SmallInput,
            )
        });
    }
}

mod core_analyses {
    use super::*;

    pub fn bench_padding_analysis(c: &mut Criterion) {
        let project = inputs::project();
        let last_record = format!("R{}", inputs::NUM_RECORDS - 1);
        c.bench_function("padding_analysis_cold_cache", |b| {
            b.iter(|| {
                let analysis = PaddingAnalysis::new(&project);
                black_box(analysis.compute_used_bits(black_box(&last_record)).is_ok())
            })
        });
    }
}

mod checkers {
    use super::*;

    pub fn bench_checkers(c: &mut Criterion) {
        let project = inputs::project();
        let config = inputs::get_config();
        let mut group = c.benchmark_group("checkers");
        for module in cert_checker_lib::get_modules() {
            group.bench_function(module.name, |b| {
                b.iter(|| {
                    let analysis_results = AnalysisResults::new(&project);
                    black_box((module.run)(&analysis_results, &config[module.name]))
                })
            });
        }
        group.finish();
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default()
        .sample_size(10)
        .warm_up_time(time::Duration::new(2, 0))
        .measurement_time(time::Duration::new(5, 0));
    targets = normalization::bench_normalize,
        core_analyses::bench_padding_analysis,
        checkers::bench_checkers,
);
criterion_main!(benches);
