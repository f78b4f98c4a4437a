//! Built-in operators of the Gibiane language.
//!
//! Every document's symbol table is seeded with this catalog before any of the
//! document's own declarations are added. Cast3M only looks at the first four
//! letters of an operator name, which is why lookups fall back to prefix
//! matching: `OPTION` and `OPTI` name the same operator.

use std::sync::LazyLock;

use crate::symbol::Function;

/// Catalog of built-in operators, in seeding order.
///
/// # Operators
///
/// ## Control flow
/// - `SI`, `SINO`, `FINSI`: conditional blocks
/// - `REPE`, `ITER`, `QUIT`, `FIN`: loops and termination
/// - `DEBP`, `FINP`, `RESP`: procedure definition
///
/// ## Meshing
/// - `OPTI`, `DENS`, `POIN`, `DROI`, `CERC`, `SURF`, `VOLU`, `TRAN`, `ELEM`,
///   `CONT`, `ET`
///
/// ## Modelling and solving
/// - `MODE`, `MATE`, `RIGI`, `BLOQ`, `DEPI`, `FORC`, `RESO`, `SIGM`, `PASAPAS`
///
/// ## Objects and output
/// - `TABL`, `PROG`, `LECT`, `EXTR`, `EVOL`, `DESS`, `TRAC`, `LIST`, `MESS`,
///   `SAUV`, `REST`
pub static BUILTINS: LazyLock<Vec<Function>> = LazyLock::new(|| {
    let temp: &[(&str, &str)] = &[
        // Control flow
        ("SI", "SI cond; ... FINSI; Executes the block when the condition holds."),
        ("SINO", "SINON; Starts the alternative branch of a SI block."),
        ("FINSI", "FINSI; Closes a SI block."),
        ("REPE", "REPE bloc n; ... FIN bloc; Repeats a block n times, or until QUIT."),
        ("ITER", "ITER bloc; Skips to the next iteration of a loop."),
        ("QUIT", "QUIT bloc; Leaves a loop."),
        ("FIN", "FIN; Ends a loop block or the program."),
        ("DEBP", "DEBP nom arg*type; Starts the definition of a procedure."),
        ("FINP", "FINP res; Ends a procedure definition and returns its results."),
        ("RESP", "RESP obj; Returns objects from a procedure."),
        // Meshing
        ("OPTI", "OPTI DIME n ELEM type; Sets global options: dimension, element type, mode."),
        ("DENS", "DENS d; Sets the default mesh density."),
        ("POIN", "POIN obj n; Extracts the n-th point of an object."),
        ("DROI", "DROI n p1 p2; Meshes the straight line between two points."),
        ("CERC", "CERC n p1 c p2; Meshes a circular arc."),
        ("SURF", "SURF cont; Meshes the surface enclosed by a contour."),
        ("VOLU", "VOLU surf n; Builds a volume mesh by extrusion or rotation."),
        ("TRAN", "TRAN n lign vec; Sweeps a mesh along a vector."),
        ("ELEM", "ELEM mail type; Extracts elements from a mesh."),
        ("CONT", "CONT mail; Extracts the boundary contour of a mesh."),
        ("ET", "mail1 ET mail2; Merges two meshes."),
        // Modelling and solving
        ("MODE", "MODE mail form comp; Associates a mesh with a formulation and model."),
        ("MATE", "MATE mod YOUN e NU nu; Defines material properties for a model."),
        ("RIGI", "RIGI mod mat; Assembles the stiffness matrix."),
        ("BLOQ", "BLOQ comp mail; Builds blocked degrees of freedom."),
        ("DEPI", "DEPI bloq val; Imposes values on blocked degrees of freedom."),
        ("FORC", "FORC comp val mail; Builds a nodal force field."),
        ("RESO", "RESO rig forc; Solves a linear system."),
        ("SIGM", "SIGM mod mat dep; Computes stresses from displacements."),
        ("PASAPAS", "PASAPAS tab; Runs the incremental nonlinear solver."),
        // Objects and output
        ("TABL", "TABL; Creates an empty table."),
        ("PROG", "PROG x1 x2 ...; Creates a list of reals."),
        ("LECT", "LECT i1 i2 ...; Creates a list of integers."),
        ("EXTR", "EXTR obj comp; Extracts a component or sub-object."),
        ("EVOL", "EVOL coul MANU x y; Builds an evolution (curve) object."),
        ("DESS", "DESS evol; Plots evolution objects."),
        ("TRAC", "TRAC obj; Draws meshes and fields."),
        ("LIST", "LIST obj; Prints the contents of an object."),
        ("MESS", "MESS 'text' obj; Prints a message."),
        ("SAUV", "SAUV 'file'; Saves the current objects."),
        ("REST", "REST 'file'; Restores saved objects."),
    ];
    temp.iter()
        .map(|(name, description)| Function::new(name, *description))
        .collect()
});
